//! 定义了记分板对外部协作者的可插拔接口。
//! Defines the pluggable interface the scoreboard uses to reach its
//! external collaborators.

use crate::block::SackBlock;

/// Congestion events surfaced to the pluggable congestion-control module.
///
/// 上报给可插拔拥塞控制模块的拥塞事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionSignal {
    /// Loss inferred from duplicate-ACK-equivalent evidence.
    /// 从等效于重复ACK的证据推断出的丢包。
    DuplicateAck,
    /// The retransmission timer fired.
    /// 重传定时器超时。
    RetransmitTimeout,
    /// The peer echoed an explicit congestion mark.
    /// 对端回显了显式拥塞标记。
    ExplicitCongestion,
}

/// The calls this engine makes on the surrounding TCP machinery. Every
/// method is invoked with the per-connection lock already held, and none may
/// block.
///
/// 本引擎对外围TCP机制发起的调用。每个方法被调用时连接锁均已被持有，
/// 且任何方法都不得阻塞。
pub trait TcpHooks {
    /// Report a DSACK observation: a received SACK block that covered
    /// already-acknowledged data. `tlp` marks a duplicate caused by a tail
    /// loss probe.
    ///
    /// 报告一次DSACK观测：收到的SACK块覆盖了已被确认的数据。`tlp`
    /// 标记由尾部丢失探测引起的重复。
    fn record_dsack(&mut self, block: SackBlock, tlp: bool);

    /// Notify the congestion-control module of a congestion event.
    /// 将拥塞事件通知拥塞控制模块。
    fn congestion_signal(&mut self, signal: CongestionSignal);

    /// Ask the segment-transmission path to run.
    /// 请求段发送路径运行。
    fn request_output(&mut self);

    /// Cancel the retransmission timer.
    /// 取消重传定时器。
    fn cancel_rexmit_timer(&mut self);

    /// The current maximum segment size in bytes.
    /// 当前的最大段大小（以字节为单位）。
    fn max_segment_size(&self) -> u32;
}
