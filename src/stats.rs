//! 记分板的可观测性计数器。
//! Observability counters for the scoreboard.

/// Event counters maintained by a connection's scoreboard. All counters are
/// mutated under the connection lock alongside the scoreboard itself.
///
/// 由连接的记分板维护的事件计数器。所有计数器都与记分板一起在连接锁
/// 下被修改。
#[derive(Debug, Clone, Default)]
pub struct SackStats {
    /// Hole allocations refused because a per-connection or global cap was
    /// reached.
    /// 因达到单连接或全局上限而被拒绝的空洞分配次数。
    pub scoreboard_overflows: u64,

    /// Retransmissions detected as themselves lost via forward-ack evidence.
    /// 通过前向确认证据检测到的自身丢失的重传次数。
    pub lost_retransmissions: u64,

    /// Rescue retransmission holes injected on partial acknowledgments.
    /// 在部分确认时注入的救援重传空洞数量。
    pub rescue_retransmissions: u64,

    /// Holes created over the life of the connection.
    /// 连接生命周期内创建的空洞数量。
    pub holes_created: u64,

    /// Holes freed over the life of the connection.
    /// 连接生命周期内释放的空洞数量。
    pub holes_freed: u64,
}
