//! 定义了记分板的可配置参数。
//! Defines configurable parameters for the scoreboard.

/// A structure containing all configurable parameters for a connection's
/// SACK scoreboard.
///
/// 包含一个连接的SACK记分板所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct SackConfig {
    /// The maximum number of holes a single connection's scoreboard may
    /// hold. Once reached, further SACK blocks stop creating holes and the
    /// scoreboard degrades toward cumulative-ACK recovery.
    ///
    /// 单个连接的记分板可以保存的空洞的最大数量。达到上限后，后续的SACK块
    /// 不再创建空洞，记分板退化为以累积ACK驱动的恢复。
    pub max_holes: usize,

    /// The maximum number of holes across all connections sharing one
    /// [`GlobalHoleBudget`](crate::scoreboard::hole::GlobalHoleBudget).
    ///
    /// 共享同一个[`GlobalHoleBudget`](crate::scoreboard::hole::GlobalHoleBudget)
    /// 的所有连接的空洞总数上限。
    pub global_max_holes: usize,

    /// Enable lost-retransmission detection bookkeeping. When a SACK block
    /// trims the right edge of a fully retransmitted hole, the hole's
    /// retransmission mark is moved to the recovery point so that forward-ack
    /// evidence passing it flags the retransmission itself as lost.
    ///
    /// 启用丢失重传检测的记账。当一个SACK块修剪了已完全重传空洞的右边缘时，
    /// 该空洞的重传标记被移动到恢复点，这样前向确认证据越过它时就能把这次
    /// 重传本身标记为丢失。
    pub lost_rexmit_detection: bool,

    /// Enable the rescue retransmission on a partial acknowledgment: when the
    /// scoreboard is idle but recovery has stalled, a single hole covering
    /// the last segment's worth of outstanding data is injected.
    ///
    /// 启用部分确认时的救援重传：当记分板空闲但恢复停滞时，注入一个覆盖
    /// 最后一段未确认数据的空洞。
    pub rescue_retransmission: bool,
}

impl Default for SackConfig {
    fn default() -> Self {
        Self {
            max_holes: 128,
            global_max_holes: 65536,
            lost_rexmit_detection: false,
            rescue_retransmission: true,
        }
    }
}
