//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the SACK scoreboard library.
///
/// The scoreboard entry points themselves never fail; malformed
/// acknowledgment input is discarded or reclassified internally. This type
/// only covers the narrow construction and decoding surface.
///
/// SACK记分板库的主要错误类型。
///
/// 记分板的入口点本身从不失败；格式错误的确认输入会在内部被丢弃或
/// 重新分类。此类型仅覆盖狭窄的构造和解码接口。
#[derive(Debug, Error)]
pub enum Error {
    /// A byte range whose end does not lie after its start.
    /// 结束位置不在起始位置之后的字节范围。
    #[error("invalid byte range: start {start} does not precede end {end}")]
    InvalidRange {
        /// The offending range start.
        start: u32,
        /// The offending range end.
        end: u32,
    },

    /// A serialized block array whose length is not a whole number of blocks.
    /// 长度不是整数个块的序列化块数组。
    #[error("malformed SACK block payload of {0} bytes")]
    MalformedBlocks(usize),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
