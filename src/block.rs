//! 定义了SACK（选择性确认）块及其序列化逻辑。
//! Defines SACK (Selective Acknowledgment) blocks and their serialization.

use crate::error::{Error, Result};
use crate::seq::SeqNum;
use bytes::{Buf, BufMut, Bytes};

/// The maximum number of blocks a received-side report list holds, and the
/// most a single ACK segment can carry.
///
/// 接收侧报告列表所保存的块的最大数量，也是单个ACK段所能携带的上限。
pub const MAX_SACK_BLOCKS: usize = 4;

/// A half-open byte range `[start, end)` reported by a selective
/// acknowledgment. Wherever a block is stored, `start < end` holds;
/// degenerate blocks are discarded at the boundary.
///
/// 由选择性确认报告的半开字节范围 `[start, end)`。块被存储时总是满足
/// `start < end`；退化的块会在边界处被丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SackBlock {
    /// The start of the acknowledged range (inclusive).
    /// 确认范围的起始（包含）。
    pub start: SeqNum,
    /// The end of the acknowledged range (exclusive).
    /// 确认范围的结束（不包含）。
    pub end: SeqNum,
}

impl SackBlock {
    /// Builds a block without checking the range.
    /// 构建一个块，不检查范围。
    pub const fn new(start: SeqNum, end: SeqNum) -> Self {
        Self { start, end }
    }

    /// Builds a block, rejecting ranges whose end does not lie after their
    /// start.
    ///
    /// 构建一个块，拒绝结束位置不在起始位置之后的范围。
    pub fn try_new(start: SeqNum, end: SeqNum) -> Result<Self> {
        if end.after(start) {
            Ok(Self { start, end })
        } else {
            Err(Error::InvalidRange {
                start: start.raw(),
                end: end.raw(),
            })
        }
    }

    /// The number of bytes the block covers.
    /// 块所覆盖的字节数。
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// True for a degenerate (empty or inverted) block.
    /// 对于退化（空或反向）的块为真。
    pub fn is_empty(&self) -> bool {
        !self.end.after(self.start)
    }

    /// True if this block covers every byte of `other`.
    /// 如果此块覆盖 `other` 的每个字节则为真。
    pub fn contains(&self, other: &SackBlock) -> bool {
        self.start.before_eq(other.start) && self.end.after_eq(other.end)
    }

    /// True if the two blocks share at least one byte or touch.
    /// 如果两个块至少共享一个字节或相邻则为真。
    pub fn overlaps_or_touches(&self, other: &SackBlock) -> bool {
        self.start.before_eq(other.end) && self.end.after_eq(other.start)
    }
}

/// The size of a single SACK block on the wire.
/// 单个SACK块在网络传输中的大小。
const SACK_BLOCK_SIZE: usize = 8; // u32 + u32

/// Encodes a list of SACK blocks into a buffer.
/// 将SACK块列表编码到缓冲区中。
pub fn encode_blocks<B: BufMut>(blocks: &[SackBlock], buf: &mut B) {
    for block in blocks {
        buf.put_u32(block.start.raw());
        buf.put_u32(block.end.raw());
    }
}

/// Decodes a list of SACK blocks from a buffer.
/// The buffer is expected to only contain whole blocks.
///
/// 从缓冲区解码SACK块列表。
/// 缓冲区应只包含完整的块。
pub fn decode_blocks(mut buf: Bytes) -> Result<Vec<SackBlock>> {
    if buf.remaining() % SACK_BLOCK_SIZE != 0 {
        return Err(Error::MalformedBlocks(buf.remaining()));
    }
    let mut blocks = Vec::with_capacity(buf.remaining() / SACK_BLOCK_SIZE);
    while buf.remaining() >= SACK_BLOCK_SIZE {
        let start = SeqNum::new(buf.get_u32());
        let end = SeqNum::new(buf.get_u32());
        blocks.push(SackBlock { start, end });
    }
    Ok(blocks)
}
