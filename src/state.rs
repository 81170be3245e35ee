//! 定义了记分板与外围TCP机制共享的发送方变量。
//! Defines the sender-side variables the scoreboard shares with the
//! surrounding TCP machinery.

use crate::seq::SeqNum;

/// The slice of the connection control block this engine reads and writes.
///
/// The surrounding TCP machinery owns these variables and passes them in by
/// reference; the caller holds the per-connection exclusive lock for the
/// whole duration of every scoreboard call. The engine never advances
/// `snd_una` itself — cumulative-ACK processing stays with the caller.
///
/// 本引擎读写的连接控制块的切片。
///
/// 外围的TCP机制拥有这些变量并以引用传入；在每次记分板调用的整个过程中，
/// 调用方都持有该连接的独占锁。引擎自身从不推进 `snd_una` ——
/// 累积ACK的处理仍归调用方负责。
#[derive(Debug, Clone)]
pub struct SendState {
    /// The oldest unacknowledged sequence number.
    /// 最早的未确认序列号。
    pub snd_una: SeqNum,

    /// The next sequence number to be sent.
    /// 下一个要发送的序列号。
    pub snd_nxt: SeqNum,

    /// The highest sequence number sent so far, plus one.
    /// 迄今为止已发送的最高序列号加一。
    pub snd_max: SeqNum,

    /// The recovery point established when loss recovery was entered.
    /// 进入丢包恢复时建立的恢复点。
    pub snd_recover: SeqNum,

    /// The congestion window in bytes.
    /// 以字节为单位的拥塞窗口。
    pub snd_cwnd: u32,

    /// The slow start threshold in bytes.
    /// 以字节为单位的慢启动阈值。
    pub snd_ssthresh: u32,

    /// Whether the connection is currently inside a fast-recovery episode.
    /// 连接当前是否处于快速恢复过程中。
    pub in_fast_recovery: bool,

    /// Whether a FIN has been sent, so that `snd_max` includes the FIN's
    /// sequence number.
    /// 是否已发送FIN，此时 `snd_max` 包含FIN的序列号。
    pub fin_sent: bool,

    /// Set by the engine to request an immediate ACK from this end.
    /// 由引擎置位，用于请求本端立即发送ACK。
    pub ack_now: bool,

    /// Whether a round-trip measurement is in progress. The engine clears
    /// this on a partial acknowledgment.
    /// 是否有一次往返时间测量正在进行。引擎在部分确认时将其清除。
    pub rtt_timing: bool,
}

impl SendState {
    /// A fresh state with every sequence variable at `initial` and recovery
    /// signalling cleared.
    ///
    /// 一个全新的状态，所有序列变量都位于 `initial`，恢复相关的信号均已
    /// 清除。
    pub fn new(initial: SeqNum) -> Self {
        Self {
            snd_una: initial,
            snd_nxt: initial,
            snd_max: initial,
            snd_recover: initial,
            snd_cwnd: 0,
            snd_ssthresh: u32::MAX,
            in_fast_recovery: false,
            fin_sent: false,
            ack_now: false,
            rtt_timing: false,
        }
    }
}
