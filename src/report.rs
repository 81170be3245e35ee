//! Maintains the received-side SACK/DSACK report list: the ordered, bounded
//! set of byte ranges this endpoint has received out of order, read by the
//! external option encoder when building outgoing ACKs.
//!
//! 维护接收侧的SACK/DSACK报告列表：本端乱序收到的字节范围的有序有界
//! 集合，由外部选项编码器在构建出站ACK时读取。

use crate::block::{MAX_SACK_BLOCKS, SackBlock};
use crate::seq::SeqNum;
use tracing::trace;

/// The received-side report list. Fixed capacity, rebuilt in place on every
/// relevant received segment; never allocates.
///
/// The first entry is the most recently reported range. An entry whose `end`
/// does not lie beyond `rcv_nxt` is a DSACK: a duplicate of data already
/// delivered in order. It is distinguishable only by that value
/// relationship, not by a flag.
///
/// 接收侧的报告列表。容量固定，在每个相关的接收段上就地重建；从不分配
/// 内存。
///
/// 第一个条目是最近报告的范围。`end` 不超过 `rcv_nxt` 的条目是DSACK：
/// 即已按序交付数据的重复。它仅通过这种数值关系区分，而非通过标志位。
#[derive(Debug, Default)]
pub struct SackReport {
    blocks: [SackBlock; MAX_SACK_BLOCKS],
    num: usize,
}

impl SackReport {
    /// Creates an empty report list.
    /// 创建一个空的报告列表。
    pub fn new() -> Self {
        Self::default()
    }

    /// The blocks to report, most recent first. This is the slice the
    /// external option encoder serializes verbatim.
    ///
    /// 要报告的块，最近的排在最前。外部选项编码器会原样序列化这个切片。
    pub fn blocks(&self) -> &[SackBlock] {
        &self.blocks[..self.num]
    }

    /// The number of blocks currently held.
    /// 当前保存的块数量。
    pub fn len(&self) -> usize {
        self.num
    }

    /// True when no blocks are held.
    /// 没有保存任何块时为真。
    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    /// Folds a newly received byte range `[rcv_start, rcv_end)` into the
    /// list.
    ///
    /// The incoming range becomes the head block; stored blocks overlapping
    /// it are merged into it, stale blocks are dropped, and the rest keep
    /// their arrival order behind it. A degenerate call with
    /// `rcv_start == rcv_end` retains the currently reported DSACK when the
    /// value matches the head entry's `end`, and adds nothing otherwise.
    ///
    /// 将新收到的字节范围 `[rcv_start, rcv_end)` 折叠进列表。
    ///
    /// 传入范围成为头部块；与之重叠的已存块被合并进去，过期的块被丢弃，
    /// 其余的块按到达顺序排在其后。当 `rcv_start == rcv_end` 的退化调用
    /// 的值与头部条目的 `end` 相符时，保留当前报告的DSACK，否则不添加
    /// 任何内容。
    pub fn update(&mut self, rcv_nxt: SeqNum, rcv_start: SeqNum, rcv_end: SeqNum) {
        debug_assert!(
            rcv_start.before_eq(rcv_end),
            "received range must not be inverted"
        );

        let mut head_blk = if rcv_start == rcv_end
            && self.num >= 1
            && rcv_end == self.blocks[0].end
        {
            // Degenerate call: keep reporting the DSACK currently on top.
            self.blocks[0]
        } else {
            SackBlock::new(rcv_start, rcv_end)
        };

        let mut saved = [SackBlock::default(); MAX_SACK_BLOCKS];
        let mut num_saved = 0;

        for i in 0..self.num {
            let start = self.blocks[i].start;
            let end = self.blocks[i].end;
            if start.after_eq(end) || start.before_eq(rcv_nxt) {
                // Degenerate or overtaken by the in-order delivery point.
            } else if head_blk.start.before_eq(end) && head_blk.end.after_eq(start) {
                // Merge this block into the head block; the block itself is
                // consumed.
                //
                // |-|
                //   |---|  merge
                //
                //     |-|
                // |---|    merge
                //
                // |-----|
                //   |-|    keep the tighter duplicate range
                if head_blk.start == end {
                    head_blk.start = start;
                } else if head_blk.end == start {
                    head_blk.end = end;
                } else if start.before(head_blk.start) && end.after(head_blk.end) {
                    // The stored block strictly contains the received range;
                    // expanding would move both edges at once, so the head
                    // keeps the tighter values.
                } else {
                    if start.before(head_blk.start) {
                        head_blk.start = start;
                    }
                    if end.after(head_blk.end) {
                        head_blk.end = end;
                    }
                }
            } else {
                // A saved block containing the previously saved one
                // supersedes it.
                if num_saved > 0
                    && end.after_eq(saved[num_saved - 1].end)
                    && start.before_eq(saved[num_saved - 1].start)
                {
                    num_saved -= 1;
                }
                saved[num_saved] = SackBlock::new(start, end);
                num_saved += 1;
            }
        }

        let mut num_head = 0;
        if head_blk.start.after(rcv_nxt) {
            // Out-of-order data: the head block goes on top. Drop the last
            // saved block if the list would overflow.
            self.blocks[0] = head_blk;
            num_head = 1;
            if num_saved >= MAX_SACK_BLOCKS {
                num_saved -= 1;
            }
        }
        if rcv_start == rcv_end && self.num >= 1 && rcv_start == self.blocks[0].end {
            num_head = 1;
        }
        num_saved = num_saved.min(MAX_SACK_BLOCKS - num_head);
        self.blocks[num_head..num_head + num_saved].copy_from_slice(&saved[..num_saved]);
        self.num = num_head + num_saved;
        trace!(num = self.num, "rebuilt receive-side SACK list");
    }

    /// Folds a received duplicate byte range `[rcv_start, rcv_end)` into the
    /// list, producing at most one DSACK head block.
    ///
    /// A duplicate lying entirely below `rcv_nxt` is stored verbatim on top.
    /// Otherwise the head becomes the maximal overlap between the duplicate
    /// and a delivered stored block, the union of the duplicate with all
    /// overlapping undelivered blocks is conditionally kept behind it, and
    /// the remaining non-overlapping out-of-order blocks follow in their
    /// original order.
    ///
    /// 将收到的重复字节范围 `[rcv_start, rcv_end)` 折叠进列表，最多产生
    /// 一个DSACK头部块。
    ///
    /// 完全位于 `rcv_nxt` 之下的重复范围被原样存到顶部。否则头部取重复
    /// 范围与已交付存储块之间的最大重叠，重复范围与所有重叠的未交付块的
    /// 并集有条件地保留在其后，其余不重叠的乱序块按原顺序排在后面。
    pub fn update_dsack(&mut self, rcv_nxt: SeqNum, rcv_start: SeqNum, rcv_end: SeqNum) {
        debug_assert!(
            rcv_start.before(rcv_end),
            "duplicate range must not be empty"
        );

        let mut saved = [SackBlock::default(); MAX_SACK_BLOCKS];

        if rcv_end.before(rcv_nxt)
            || (rcv_end == rcv_nxt && self.num > 0 && self.blocks[0].end == rcv_nxt)
        {
            // The whole duplicate was already delivered in order: it is the
            // DSACK candidate as is.
            saved[0] = SackBlock::new(rcv_start, rcv_end);
        }

        let mut head_blk = SackBlock::default();
        let mut mid_blk: Option<SackBlock> = None;
        let mut identical = false;

        for i in 0..self.num {
            let start = self.blocks[i].start;
            let end = self.blocks[i].end;
            if rcv_end.before(start) || rcv_start.after(end) {
                // No overlap with the duplicate range.
                continue;
            }
            if rcv_nxt.after(end) {
                // Fully delivered stored block: its overlap with the
                // duplicate competes for the DSACK head; the earliest
                // non-empty overlap wins.
                let ov_start = SeqNum::max(rcv_start, start);
                let ov_end = SeqNum::min(rcv_end, end);
                if ov_start != ov_end
                    && (head_blk.start.after(ov_start) || head_blk.start == head_blk.end)
                {
                    head_blk = SackBlock::new(ov_start, ov_end);
                }
                continue;
            }
            if (head_blk.start == head_blk.end || start.before(head_blk.start))
                && rcv_nxt.after(start)
                && rcv_nxt.before_eq(end)
            {
                // A stored block straddling the delivery point.
                head_blk = SackBlock::new(start, end);
            }
            let merged = match mid_blk {
                Some(m) => SackBlock::new(
                    SeqNum::min(m.start, start),
                    SeqNum::max(m.end, end),
                ),
                None => SackBlock::new(
                    SeqNum::min(rcv_start, start),
                    SeqNum::max(rcv_end, end),
                ),
            };
            if merged.start == start && merged.end == end {
                identical = true;
            }
            mid_blk = Some(merged);
        }

        if head_blk.start.before(head_blk.end) {
            saved[0] = SackBlock::new(
                SeqNum::max(rcv_start, head_blk.start),
                SeqNum::min(rcv_end, head_blk.end),
            );
        }

        let mut n = 1;
        if let Some(mid) = mid_blk {
            // Keep the merged block while part of it is still undelivered,
            // unless it duplicates the head. An identical re-delivery is
            // kept regardless so the peer still sees the duplicate flagged.
            if (rcv_nxt.before(mid.end) && mid != saved[0]) || identical {
                saved[n] = mid;
                n += 1;
            }
        }
        for j in 0..self.num {
            if n >= MAX_SACK_BLOCKS {
                break;
            }
            let blk = self.blocks[j];
            let outside_mid = match mid_blk {
                Some(mid) => blk.end.before(mid.start) || blk.start.after(mid.end),
                None => true,
            };
            if outside_mid && blk.start.after(rcv_nxt) {
                saved[n] = blk;
                n += 1;
            }
        }

        // Compact, dropping any degenerate entry picked up along the way.
        let mut k = 0;
        for i in 0..n {
            if saved[i].start.before(saved[i].end) {
                self.blocks[k] = saved[i];
                k += 1;
            }
        }
        self.num = k;
        trace!(num = self.num, "rebuilt receive-side DSACK list");
    }

    /// True iff the head entry is a DSACK: a range already delivered in
    /// order.
    ///
    /// 当且仅当头部条目是DSACK（即已按序交付的范围）时为真。
    pub fn has_dsack_block(&self, rcv_nxt: SeqNum) -> bool {
        self.num > 0 && self.blocks[0].end.before_eq(rcv_nxt)
    }

    /// Drops every degenerate or already-delivered block, compacting the
    /// remainder in place and preserving order.
    ///
    /// 丢弃所有退化或已交付的块，就地压缩其余的块并保持顺序。
    pub fn clean_dsack_blocks(&mut self, rcv_nxt: SeqNum) {
        let mut k = 0;
        for i in 0..self.num {
            let blk = self.blocks[i];
            if blk.start.after_eq(blk.end) || blk.end.before_eq(rcv_nxt) {
                continue;
            }
            self.blocks[k] = blk;
            k += 1;
        }
        self.num = k;
    }

    /// Resets the list. Called on events that invalidate all received-side
    /// SACK state, such as a retransmission timeout or a connection reset.
    ///
    /// 重置列表。在使所有接收侧SACK状态失效的事件（如重传超时或连接
    /// 重置）时调用。
    pub fn clear(&mut self) {
        self.num = 0;
        self.blocks = [SackBlock::default(); MAX_SACK_BLOCKS];
    }
}
