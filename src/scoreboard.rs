//! The send-side SACK scoreboard: the ordered hole list tracking which byte
//! ranges of the in-flight window are believed lost, the per-ACK update
//! algorithm, and the retransmission selector built on top of it.
//!
//! 发送侧SACK记分板：跟踪在途窗口中哪些字节范围被认为丢失的有序空洞
//! 列表、逐ACK的更新算法，以及建立在其上的重传选择器。

pub mod hole;


use crate::block::{MAX_SACK_BLOCKS, SackBlock};
use crate::config::SackConfig;
use crate::hooks::{CongestionSignal, TcpHooks};
use crate::seq::SeqNum;
use crate::state::SendState;
use crate::stats::SackStats;
use hole::{GlobalHoleBudget, Hole, HoleId, HoleList};
use std::sync::Arc;
use tracing::{debug, trace};

/// Cached incremental scoreboard state, maintained so that neither the ACK
/// path nor the output path ever rescans the whole hole list.
///
/// 缓存的增量记分板状态，其存在使ACK路径和输出路径都无需重新扫描整个
/// 空洞列表。
#[derive(Debug, Default)]
pub struct SackHint {
    /// The next hole the retransmission selector will hand out.
    /// 重传选择器将交出的下一个空洞。
    pub(crate) next_hole: Option<HoleId>,
    /// Bytes retransmitted out of the current holes and not yet SACKed:
    /// the sum of `min(rxmit, end) - start` over the list.
    /// 已从当前空洞重传但尚未被SACK的字节数：列表上
    /// `min(rxmit, end) - start` 的总和。
    pub sack_bytes_rexmit: i64,
    /// Bytes selectively acknowledged since the scoreboard was last
    /// bootstrapped.
    /// 自记分板上次引导以来被选择性确认的字节数。
    pub sacked_bytes: i64,
    /// Bytes newly acknowledged, cumulatively or selectively, by the most
    /// recent ACK.
    /// 最近一个ACK新确认（累积或选择性）的字节数。
    pub delivered_data: i64,
    /// Flight size captured at recovery entry, kept for proportional rate
    /// reduction bookkeeping.
    /// 进入恢复时记录的在途数据量，为按比例速率缩减的记账而保留。
    pub recover_fs: i64,
    /// The cumulative ACK carried by the last ACK that reached the
    /// scoreboard.
    /// 最近一个到达记分板的ACK所携带的累积确认号。
    pub last_sack_ack: SeqNum,
}

/// The send-side scoreboard of one connection.
///
/// All entry points require the caller to hold the connection's exclusive
/// lock for their whole duration; the scoreboard adds no synchronization of
/// its own beyond the shared hole budget's atomic counter.
///
/// 一个连接的发送侧记分板。
///
/// 所有入口点都要求调用方在整个调用期间持有该连接的独占锁；除共享空洞
/// 预算的原子计数器外，记分板自身不提供任何同步。
#[derive(Debug)]
pub struct Scoreboard {
    holes: HoleList,
    fack: SeqNum,
    hint: SackHint,
    config: SackConfig,
    global: Arc<GlobalHoleBudget>,
    stats: SackStats,
}

impl Scoreboard {
    /// Creates an empty scoreboard charged against `global`.
    /// 创建一个计入 `global` 预算的空记分板。
    pub fn new(config: SackConfig, global: Arc<GlobalHoleBudget>) -> Self {
        Self {
            holes: HoleList::new(),
            fack: SeqNum::default(),
            hint: SackHint::default(),
            config,
            global,
            stats: SackStats::default(),
        }
    }

    /// The forward-most sequence number known to have left the network.
    /// 已知离开网络的最前沿序列号。
    pub fn fack(&self) -> SeqNum {
        self.fack
    }

    /// The number of holes currently on the scoreboard.
    /// 记分板上当前的空洞数量。
    pub fn num_holes(&self) -> usize {
        self.holes.len()
    }

    /// The holes in sequence order.
    /// 按序列顺序排列的空洞。
    pub fn holes(&self) -> impl Iterator<Item = &Hole> {
        self.holes.iter().map(|(_, hole)| hole)
    }

    /// Looks up a hole by handle. `None` once the hole has been removed.
    /// 按句柄查找空洞。空洞被移除后返回 `None`。
    pub fn hole(&self, id: HoleId) -> Option<&Hole> {
        self.holes.try_get(id)
    }

    /// The cached incremental state.
    /// 缓存的增量状态。
    pub fn hint(&self) -> &SackHint {
        &self.hint
    }

    /// Event counters.
    /// 事件计数器。
    pub fn stats(&self) -> &SackStats {
        &self.stats
    }

    /// Folds one incoming ACK and its decoded SACK option into the
    /// scoreboard.
    ///
    /// `sack_option` is `None` when the segment carried no SACK option at
    /// all, `Some` with the decoded blocks otherwise. Returns whether the
    /// scoreboard gained new out-of-order information; a pure cumulative ACK
    /// always reports `false`, so the caller can use the result directly for
    /// duplicate-ACK accounting.
    ///
    /// 将一个传入的ACK及其解码后的SACK选项折叠进记分板。
    ///
    /// 段完全不携带SACK选项时 `sack_option` 为 `None`，否则为携带已解码
    /// 块的 `Some`。返回记分板是否获得了新的乱序信息；纯累积ACK总是返回
    /// `false`，因此调用方可直接将结果用于重复ACK的统计。
    pub fn process_ack(
        &mut self,
        state: &SendState,
        th_ack: SeqNum,
        sack_option: Option<&[SackBlock]>,
        hooks: &mut impl TcpHooks,
    ) -> bool {
        let lrd = self.config.lost_rexmit_detection;
        let mut blocks = [SackBlock::default(); MAX_SACK_BLOCKS + 1];
        let mut num = 0usize;
        let mut sack_changed = false;
        let mut delivered_data: i64 = 0;
        let mut left_edge_delta: i64 = 0;

        // Treat [snd_una, th_ack) as an implicit SACK block when the
        // cumulative ACK advances over an existing scoreboard.
        if state.snd_una.before(th_ack) && !self.holes.is_empty() {
            left_edge_delta = i64::from(th_ack - state.snd_una);
            blocks[num] = SackBlock::new(state.snd_una, th_ack);
            num += 1;
            if self.fack.before(th_ack) {
                delivered_data += i64::from(th_ack - state.snd_una);
                self.fack = th_ack;
                sack_changed = true;
            }
        }

        if let Some(wire_blocks) = sack_option {
            for blk in wire_blocks.iter().take(MAX_SACK_BLOCKS) {
                if blk.end.after(blk.start)
                    && blk.start.after(state.snd_una)
                    && blk.start.after(th_ack)
                    && blk.start.before(state.snd_max)
                    && blk.end.after(state.snd_una)
                    && blk.end.before_eq(state.snd_max)
                {
                    blocks[num] = *blk;
                    num += 1;
                } else if blk.start.before_eq(th_ack) && blk.end.before_eq(th_ack) {
                    // The peer reports a range below the cumulative ACK: a
                    // DSACK observation, not scoreboard input.
                    hooks.record_dsack(*blk, false);
                }
            }
        }

        // Neither a cumulative advance nor a new SACK block.
        if num == 0 {
            return sack_changed;
        }

        // Ascending end order lets one tail-to-head sweep fold every block
        // in; n is at most five, so the quadratic sort is the cheap option.
        for i in 0..num {
            for j in (i + 1)..num {
                if blocks[i].end.after(blocks[j].end) {
                    blocks.swap(i, j);
                }
            }
        }

        if self.holes.is_empty() {
            // Lazily (re)bootstrap the scoreboard; fack may hold a stale
            // value from a previous episode.
            self.fack = SeqNum::max(state.snd_una, th_ack);
            self.hint.sacked_bytes = 0;
        }
        self.hint.last_sack_ack = th_ack;

        let mut bi = num as isize - 1;
        let top = blocks[bi as usize];
        if self.fack.before(top.start) {
            // The highest block lies beyond fack. A last hole still ending
            // at or beyond fack means a rescue retransmission was just
            // SACKed; otherwise a fresh hole opens at the forward edge.
            let rescued = self
                .holes
                .last()
                .filter(|&last| self.fack.before_eq(self.holes.get(last).end));
            if let Some(last) = rescued {
                let new_start = SeqNum::max(self.fack, SeqNum::max(state.snd_una, th_ack));
                let hole = self.holes.get_mut(last);
                hole.start = new_start;
                hole.end = top.start;
                hole.rxmit = new_start;
                delivered_data += i64::from(top.end - top.start);
                self.fack = top.end;
                sack_changed = true;
                bi -= 1;
            } else if self.hole_insert(self.fack, top.start, None).is_some() {
                delivered_data += i64::from(top.end - top.start);
                self.fack = top.end;
                sack_changed = true;
                bi -= 1;
            } else {
                // The hole could not be represented. Still pull fack to the
                // highest edge seen so the scoreboard is at least trimmed
                // for it, then skip whatever remains beyond fack.
                if self.fack.before(top.end) {
                    delivered_data += i64::from(top.end - self.fack);
                    self.fack = top.end;
                    sack_changed = true;
                }
                while bi >= 0 && self.fack.before(blocks[bi as usize].start) {
                    bi -= 1;
                }
            }
        } else if self.fack.before(top.end) {
            delivered_data += i64::from(top.end - self.fack);
            self.fack = top.end;
            sack_changed = true;
        }

        // Merge-sweep the sorted blocks (highest to lowest) against the hole
        // list from its tail. List order is sequence order, so both sides
        // descend together.
        let mut cur = self.holes.last();
        while bi >= 0 {
            let Some(cid) = cur else { break };
            let blk = blocks[bi as usize];
            let hole = *self.holes.get(cid);
            if blk.start.after_eq(hole.end) {
                // Block entirely beyond this hole.
                bi -= 1;
                continue;
            }
            if blk.end.before_eq(hole.start) {
                // Block entirely before this hole.
                cur = self.holes.prev(cid);
                continue;
            }
            // Overlap. Retire the hole's retransmitted-byte contribution
            // while it mutates; it is re-added below.
            self.hint.sack_bytes_rexmit -=
                i64::from(SeqNum::min(hole.rxmit, hole.end) - hole.start);
            debug_assert!(
                self.hint.sack_bytes_rexmit >= 0,
                "sack_bytes_rexmit went negative"
            );
            if blk.start.before_eq(hole.start) {
                if blk.end.after_eq(hole.end) {
                    // The block acknowledges the entire hole. It may reach
                    // into earlier holes too, so the block cursor stays put.
                    delivered_data += i64::from(hole.end - hole.start);
                    let prev = self.holes.prev(cid);
                    self.hole_remove(cid);
                    cur = prev;
                    continue;
                }
                // Left part acknowledged: move the start forward.
                delivered_data += i64::from(blk.end - hole.start);
                let h = self.holes.get_mut(cid);
                h.start = blk.end;
                h.rxmit = SeqNum::max(h.rxmit, h.start);
            } else if blk.end.after_eq(hole.end) {
                // Right part acknowledged: move the end backward.
                delivered_data += i64::from(hole.end - blk.start);
                let h = self.holes.get_mut(cid);
                h.end = blk.start;
                h.rxmit = SeqNum::min(h.rxmit, h.end);
                if lrd && h.rxmit.after_eq(h.end) {
                    // The trimmed hole was already fully retransmitted;
                    // stamp it with the recovery point so forward-ack
                    // evidence passing it flags the retransmission as lost.
                    h.rxmit = state.snd_recover;
                }
            } else {
                // Interior acknowledgment: split the hole, the new right
                // part inheriting whatever retransmission progress reaches
                // into it.
                if let Some(new_id) = self.hole_insert(blk.end, hole.end, Some(cid)) {
                    if hole.rxmit.after(blk.end) {
                        self.holes.get_mut(new_id).rxmit = hole.rxmit;
                        self.hint.sack_bytes_rexmit +=
                            i64::from(SeqNum::min(hole.rxmit, hole.end) - blk.end);
                    }
                    delivered_data += i64::from(blk.end - blk.start);
                    let h = self.holes.get_mut(cid);
                    h.end = blk.start;
                    h.rxmit = SeqNum::min(h.rxmit, h.end);
                    if lrd && h.rxmit.after_eq(h.end) {
                        h.rxmit = state.snd_recover;
                    }
                }
            }
            let hole = *self.holes.get(cid);
            self.hint.sack_bytes_rexmit +=
                i64::from(SeqNum::min(hole.rxmit, hole.end) - hole.start);
            // Whichever side finished first advances.
            if blk.start.before_eq(hole.start) {
                cur = self.holes.prev(cid);
            } else {
                bi -= 1;
            }
        }

        if sack_option.is_none() {
            // This ACK only moved the left edge: a pure cumulative ACK must
            // not read as new out-of-order information to duplicate-ACK
            // accounting.
            sack_changed = false;
        }
        self.hint.delivered_data = delivered_data;
        self.hint.sacked_bytes += delivered_data - left_edge_delta;
        debug_assert!(delivered_data >= 0, "delivered_data went negative");
        debug_assert!(self.hint.sacked_bytes >= 0, "sacked_bytes went negative");
        trace!(
            th_ack = th_ack.raw(),
            fack = self.fack.raw(),
            num_holes = self.holes.len(),
            delivered = delivered_data,
            changed = sack_changed,
            "scoreboard updated"
        );
        sack_changed
    }

    /// Picks the next hole to retransmit from, along with the cached count
    /// of bytes already retransmitted out of the scoreboard.
    ///
    /// Scans forward from the cached hole past anything already fully
    /// retransmitted, updating the cache; `None` once the list is exhausted.
    ///
    /// 选出下一个要从中重传的空洞，并附带缓存的已从记分板重传的字节数。
    ///
    /// 从缓存的空洞向前跳过所有已完全重传的空洞并更新缓存；列表耗尽时
    /// 返回 `None`。
    pub fn next_rexmit_hole(&mut self) -> (Option<HoleId>, u64) {
        let rexmit_bytes = self.hint.sack_bytes_rexmit.max(0) as u64;
        let Some(mut id) = self.hint.next_hole else {
            return (None, rexmit_bytes);
        };
        if self.holes.get(id).fully_retransmitted() {
            loop {
                match self.holes.next(id) {
                    None => return (None, rexmit_bytes),
                    Some(next) => {
                        id = next;
                        if !self.holes.get(id).fully_retransmitted() {
                            break;
                        }
                    }
                }
            }
            self.hint.next_hole = Some(id);
        }
        (Some(id), rexmit_bytes)
    }

    /// Records that the output path retransmitted the hole's bytes up to
    /// `up_to`, keeping the retransmitted-byte hint in step.
    ///
    /// 记录输出路径已将该空洞重传到 `up_to`，同时保持已重传字节数提示的
    /// 同步。
    pub fn mark_retransmitted(&mut self, id: HoleId, up_to: SeqNum) {
        let hole = *self.holes.get(id);
        debug_assert!(
            up_to.after_eq(hole.start) && up_to.before_eq(hole.end),
            "retransmission mark outside hole"
        );
        if up_to.after(hole.rxmit) {
            let sent = up_to - hole.rxmit;
            self.holes.get_mut(id).rxmit = up_to;
            self.hint.sack_bytes_rexmit += i64::from(sent);
            trace!(
                start = hole.start.raw(),
                rxmit = up_to.raw(),
                sent,
                "hole retransmission advanced"
            );
        }
    }

    /// After a retransmission-timeout rebuild, advances `snd_nxt` past any
    /// already-SACKed region it sits in: up to the next hole still holding
    /// unSACKed data, or to fack once the holes are exhausted.
    ///
    /// 在重传超时重建之后，将 `snd_nxt` 推进出其所处的已被SACK的区域：
    /// 推进到仍含未SACK数据的下一个空洞，或在空洞耗尽后推进到fack。
    pub fn adjust(&self, state: &mut SendState) {
        let Some(mut cur) = self.holes.first() else {
            return;
        };
        if state.snd_nxt.after_eq(self.fack) {
            return;
        }
        while let Some(next) = self.holes.next(cur) {
            if state.snd_nxt.before(self.holes.get(cur).end) {
                return;
            }
            if state.snd_nxt.after_eq(self.holes.get(next).start) {
                cur = next;
            } else {
                state.snd_nxt = self.holes.get(next).start;
                return;
            }
        }
        if state.snd_nxt.before(self.holes.get(cur).end) {
            return;
        }
        state.snd_nxt = self.fack;
    }

    /// Detects a lost retransmission: during recovery, fack has moved past
    /// the recovery point and past the first hole's fully-retransmitted
    /// mark, so that retransmission itself is gone. Re-arms every such hole,
    /// exits recovery, signals congestion control, and collapses the window
    /// to a single segment. Returns whether the condition fired.
    ///
    /// 检测丢失的重传：恢复期间，fack已越过恢复点并越过第一个空洞的
    /// 完全重传标记，说明那次重传本身已丢失。重新武装所有此类空洞、退出
    /// 恢复、通知拥塞控制，并将窗口收缩到单个段。返回该条件是否触发。
    pub fn lost_retransmission(
        &mut self,
        state: &mut SendState,
        hooks: &mut impl TcpHooks,
    ) -> bool {
        let Some(first) = self.holes.first() else {
            return false;
        };
        let first_hole = *self.holes.get(first);
        if !(state.in_fast_recovery
            && self.fack.after(state.snd_recover)
            && first_hole.fully_retransmitted()
            && self.fack.after_eq(first_hole.rxmit))
        {
            return false;
        }
        self.stats.lost_retransmissions += 1;
        debug!(
            fack = self.fack.raw(),
            snd_recover = state.snd_recover.raw(),
            "lost retransmission detected, restarting from the first hole"
        );
        // Start retransmissions over from the first hole, and re-arm every
        // fully retransmitted hole the forward-ack evidence covers. Their
        // bytes leave the retransmitted-byte hint with them.
        self.hint.next_hole = Some(first);
        let mut id = Some(first);
        while let Some(hid) = id {
            let hole = *self.holes.get(hid);
            if self.fack.after_eq(hole.rxmit) && hole.fully_retransmitted() {
                self.hint.sack_bytes_rexmit -=
                    i64::from(SeqNum::min(hole.rxmit, hole.end) - hole.start);
                self.holes.get_mut(hid).rxmit = hole.start;
            }
            id = self.holes.next(hid);
        }
        debug_assert!(
            self.hint.sack_bytes_rexmit >= 0,
            "sack_bytes_rexmit went negative"
        );
        state.in_fast_recovery = false;
        hooks.congestion_signal(CongestionSignal::DuplicateAck);
        state.snd_cwnd = hooks.max_segment_size();
        self.hint.recover_fs = i64::from(state.snd_max - state.snd_una) - self.hint.recover_fs;
        true
    }

    /// Handles a partial acknowledgment during recovery: stops the
    /// retransmission timer and RTT timing, constrains the congestion window
    /// to what is plausibly in flight, forces an immediate ACK, possibly
    /// injects a rescue retransmission hole, and asks the output path to
    /// run.
    ///
    /// 处理恢复期间的部分确认：停止重传定时器和RTT计时，将拥塞窗口限制
    /// 在可信的在途数据量内，强制立即发送ACK，可能注入一个救援重传空洞，
    /// 并请求输出路径运行。
    pub fn partial_ack(
        &mut self,
        state: &mut SendState,
        th_ack: SeqNum,
        hooks: &mut impl TcpHooks,
    ) {
        hooks.cancel_rexmit_timer();
        state.rtt_timing = false;
        let maxseg = hooks.max_segment_size();
        // Send one extra segment when the ACK covered at least two full
        // segments of new data.
        let bytes_this_ack = th_ack - state.snd_una;
        let num_segs: u64 = if maxseg > 0 && bytes_this_ack / maxseg >= 2 {
            2
        } else {
            1
        };
        let pipe = self.hint.sack_bytes_rexmit.max(0) as u64
            + u64::from(state.snd_nxt - state.snd_recover)
            + num_segs * u64::from(maxseg);
        state.snd_cwnd = pipe.min(u64::from(state.snd_ssthresh)) as u32;
        state.ack_now = true;

        // Rescue retransmission: the scoreboard is idle, nothing was sent
        // past the recovery point, and a full cumulative ACK just delivered
        // data. Without a hole to drive it, recovery would stall until the
        // retransmission timer fires, so one hole covering the last
        // segment's worth of outstanding data is injected. The FIN sequence
        // number stays out of the hole, and a FIN alone gets none.
        if self.config.rescue_retransmission
            && state.snd_recover == state.snd_max
            && self.holes.is_empty()
            && self.hint.delivered_data > 0
        {
            let mut highdata = state.snd_max;
            if state.fin_sent {
                highdata = highdata - 1u32;
            }
            if th_ack != highdata {
                self.fack = th_ack;
                let start = SeqNum::max(th_ack, highdata - maxseg);
                if self.hole_insert(start, highdata, None).is_some() {
                    self.stats.rescue_retransmissions += 1;
                    debug!(
                        start = start.raw(),
                        end = highdata.raw(),
                        "injected rescue retransmission hole"
                    );
                }
            }
        }
        hooks.request_output();
    }

    /// Drops every hole and zeroes the retransmitted-byte hint. Called on
    /// retransmission timeout or connection teardown.
    ///
    /// 丢弃所有空洞并清零已重传字节数提示。在重传超时或连接拆除时调用。
    pub fn clear(&mut self) {
        while let Some(first) = self.holes.first() {
            self.hole_remove(first);
        }
        self.hint.sack_bytes_rexmit = 0;
        debug_assert!(self.holes.is_empty(), "holes survived a scoreboard clear");
        debug_assert!(
            self.hint.next_hole.is_none(),
            "stale next-hole cache after a scoreboard clear"
        );
    }

    /// Allocates a hole and links it after `after` (at the tail when
    /// `None`). Refused without error when either the per-connection or the
    /// global cap is reached.
    ///
    /// 分配一个空洞并链接到 `after` 之后（为 `None` 时链接到尾部）。当
    /// 达到单连接或全局上限时拒绝分配，但不产生错误。
    fn hole_insert(&mut self, start: SeqNum, end: SeqNum, after: Option<HoleId>) -> Option<HoleId> {
        if self.holes.len() >= self.config.max_holes || !self.global.try_acquire() {
            self.stats.scoreboard_overflows += 1;
            debug!(
                num_holes = self.holes.len(),
                global_in_use = self.global.in_use(),
                "scoreboard full, not tracking hole"
            );
            return None;
        }
        let id = self.holes.insert_after(after, Hole::new(start, end));
        self.stats.holes_created += 1;
        if self.hint.next_hole.is_none() {
            self.hint.next_hole = Some(id);
        }
        trace!(
            start = start.raw(),
            end = end.raw(),
            "scoreboard hole inserted"
        );
        Some(id)
    }

    /// Unlinks and frees a hole, repointing the next-hole cache at its
    /// successor first.
    ///
    /// 解除并释放一个空洞，先将“下一个空洞”缓存重新指向其后继。
    fn hole_remove(&mut self, id: HoleId) {
        if self.hint.next_hole == Some(id) {
            self.hint.next_hole = self.holes.next(id);
        }
        let hole = self.holes.remove(id);
        self.global.release();
        self.stats.holes_freed += 1;
        trace!(
            start = hole.start.raw(),
            end = hole.end.raw(),
            "scoreboard hole removed"
        );
    }
}
