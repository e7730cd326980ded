use binary_heap_plus::{BinaryHeap, MinComparator};

/// 最小代价优先队列. 代价相同时先进先出.
///
/// 不支持原地降低代价: 重复插入同一体素, 旧条目由调用者在弹出时丢弃.
pub(crate) struct Frontier {
    // (代价, 插入序号, 地址). 插入序号唯一, 因此不会比较到地址.
    heap: BinaryHeap<(i64, u64, usize), MinComparator>,
    seq: u64,
}

impl Frontier {
    #[inline]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new_min(),
            seq: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, cost: i64, p: usize) {
        self.heap.push((cost, self.seq, p));
        self.seq += 1;
    }

    /// 弹出代价最小 (同代价中最早插入) 的 `(代价, 地址)`.
    #[inline]
    pub fn pop(&mut self) -> Option<(i64, usize)> {
        self.heap.pop().map(|(cost, _, p)| (cost, p))
    }

    #[cfg(test)]
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// 清空队列. 插入序号继续递增.
    #[inline]
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::Frontier;

    #[test]
    fn test_frontier_fifo_ties() {
        let mut q = Frontier::new();
        q.push(5, 100);
        q.push(1, 7);
        q.push(5, 3);
        q.push(1, 2);
        q.push(0, 50);
        assert_eq!(q.len(), 5);

        let order: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(order, vec![(0, 50), (1, 7), (1, 2), (5, 100), (5, 3)]);
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_frontier_clear() {
        let mut q = Frontier::new();
        q.push(2, 1);
        q.clear();
        assert_eq!(q.len(), 0);
        q.push(3, 9);
        assert_eq!(q.pop(), Some((3, 9)));
    }
}
