//! End-to-end loss-recovery episodes driving the receive-side report list
//! and the send-side scoreboard together through the public API.

use std::sync::Once;

use sack_scoreboard::block::{SackBlock, decode_blocks, encode_blocks};
use sack_scoreboard::config::SackConfig;
use sack_scoreboard::hooks::{CongestionSignal, TcpHooks};
use sack_scoreboard::report::SackReport;
use sack_scoreboard::scoreboard::Scoreboard;
use sack_scoreboard::scoreboard::hole::GlobalHoleBudget;
use sack_scoreboard::seq::SeqNum;
use sack_scoreboard::state::SendState;

/// Helper to initialize tracing for tests.
fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("trace")
            .with_test_writer()
            .init();
    });
}

#[derive(Debug, Default)]
struct TestHooks {
    maxseg: u32,
    dsacks: Vec<SackBlock>,
    signals: Vec<CongestionSignal>,
    output_requests: usize,
    timer_cancels: usize,
}

impl TestHooks {
    fn new(maxseg: u32) -> Self {
        Self {
            maxseg,
            ..Self::default()
        }
    }
}

impl TcpHooks for TestHooks {
    fn record_dsack(&mut self, block: SackBlock, _tlp: bool) {
        self.dsacks.push(block);
    }

    fn congestion_signal(&mut self, signal: CongestionSignal) {
        self.signals.push(signal);
    }

    fn request_output(&mut self) {
        self.output_requests += 1;
    }

    fn cancel_rexmit_timer(&mut self) {
        self.timer_cancels += 1;
    }

    fn max_segment_size(&self) -> u32 {
        self.maxseg
    }
}

fn seq(v: u32) -> SeqNum {
    SeqNum::new(v)
}

fn hole_ranges(scoreboard: &Scoreboard) -> Vec<(u32, u32)> {
    scoreboard
        .holes()
        .map(|h| (h.start.raw(), h.end.raw()))
        .collect()
}

/// Carries the receiver's report list to the sender the way the option
/// encoder and parser would: through the serialized block format.
fn over_the_wire(report: &SackReport) -> Vec<SackBlock> {
    let mut payload = bytes::BytesMut::new();
    encode_blocks(report.blocks(), &mut payload);
    decode_blocks(payload.freeze()).expect("wire blocks round-trip")
}

#[test]
fn test_full_recovery_episode() {
    init_tracing();
    let maxseg = 1000u32;
    let mut hooks = TestHooks::new(maxseg);

    // Five segments of one MSS are in flight.
    let mut state = SendState::new(seq(0));
    state.snd_max = seq(5000);
    state.snd_nxt = seq(5000);
    state.snd_recover = seq(5000);
    let mut scoreboard = Scoreboard::new(SackConfig::default(), GlobalHoleBudget::new(1024));

    // Segments two and four arrive; one, three and five are missing.
    let mut report = SackReport::new();
    let rcv_nxt = seq(0);
    report.update(rcv_nxt, seq(2000), seq(3000));
    report.update(rcv_nxt, seq(4000), seq(5000));

    let wire = over_the_wire(&report);
    assert_eq!(
        wire,
        vec![
            SackBlock::new(seq(4000), seq(5000)),
            SackBlock::new(seq(2000), seq(3000)),
        ]
    );

    // The duplicate ACK with both SACK blocks builds the scoreboard.
    let changed = scoreboard.process_ack(&state, seq(0), Some(&wire), &mut hooks);
    assert!(changed);
    assert_eq!(hole_ranges(&scoreboard), vec![(0, 2000), (3000, 4000)]);
    assert_eq!(scoreboard.fack(), seq(5000));
    assert_eq!(scoreboard.hint().sacked_bytes, 2000);

    // The output path retransmits the first segment of the first hole.
    let (hole, rexmit_bytes) = scoreboard.next_rexmit_hole();
    let hole = hole.expect("first hole pending");
    assert_eq!(rexmit_bytes, 0);
    assert_eq!(scoreboard.hole(hole).expect("live hole").start, seq(0));
    scoreboard.mark_retransmitted(hole, seq(maxseg));

    // The retransmission lands; the receiver delivers [0, 1000) in order.
    let _rcv_nxt = seq(1000);
    let wire = over_the_wire(&report);
    let changed = scoreboard.process_ack(&state, seq(1000), Some(&wire), &mut hooks);
    // Nothing newly out of order: the ACK only moved the left edge over
    // already-known territory.
    assert!(!changed);
    assert_eq!(hole_ranges(&scoreboard), vec![(1000, 2000), (3000, 4000)]);
    state.snd_una = seq(1000);

    // Retransmit the rest of both holes. The bytes retransmitted so far
    // were just cumulatively acknowledged, so the hint is back to zero.
    let (hole, rexmit_bytes) = scoreboard.next_rexmit_hole();
    let hole = hole.expect("first hole still open");
    assert_eq!(rexmit_bytes, 0);
    scoreboard.mark_retransmitted(hole, seq(2000));
    let (hole, _) = scoreboard.next_rexmit_hole();
    let hole = hole.expect("second hole pending");
    assert_eq!(scoreboard.hole(hole).expect("live hole").start, seq(3000));
    scoreboard.mark_retransmitted(hole, seq(4000));
    let (hole, _) = scoreboard.next_rexmit_hole();
    assert!(hole.is_none());

    // Everything arrives; the receiver's report drains and the final
    // cumulative ACK empties the scoreboard.
    report.clean_dsack_blocks(seq(5000));
    assert!(report.is_empty());
    let changed = scoreboard.process_ack(&state, seq(5000), None, &mut hooks);
    assert!(!changed);
    assert_eq!(scoreboard.num_holes(), 0);
    assert!(hooks.dsacks.is_empty());
    assert!(hooks.signals.is_empty());
}

#[test]
fn test_partial_ack_then_rescue_round_trip() {
    init_tracing();
    let maxseg = 1000u32;
    let mut hooks = TestHooks::new(maxseg);

    let mut state = SendState::new(seq(0));
    state.snd_max = seq(10000);
    state.snd_nxt = seq(10000);
    state.snd_recover = seq(10000);
    state.in_fast_recovery = true;
    let mut scoreboard = Scoreboard::new(SackConfig::default(), GlobalHoleBudget::new(1024));

    // One SACKed range, then a cumulative catch-up leaves the board idle.
    assert!(scoreboard.process_ack(
        &state,
        seq(0),
        Some(&[SackBlock::new(seq(500), seq(1000))]),
        &mut hooks,
    ));
    assert!(!scoreboard.process_ack(&state, seq(500), None, &mut hooks));
    assert_eq!(scoreboard.num_holes(), 0);

    // The partial ACK injects a rescue hole at the tail of the window.
    scoreboard.partial_ack(&mut state, seq(500), &mut hooks);
    assert_eq!(hole_ranges(&scoreboard), vec![(9000, 10000)]);
    assert_eq!(scoreboard.fack(), seq(500));
    assert_eq!(hooks.timer_cancels, 1);
    assert_eq!(hooks.output_requests, 1);
    assert!(state.ack_now);

    // The rescue retransmission is SACKed; the tail hole slides left over
    // the still-missing bytes and fack jumps to the forward edge.
    state.snd_una = seq(500);
    let changed = scoreboard.process_ack(
        &state,
        seq(500),
        Some(&[SackBlock::new(seq(9000), seq(10000))]),
        &mut hooks,
    );
    assert!(changed);
    assert_eq!(hole_ranges(&scoreboard), vec![(500, 9000)]);
    assert_eq!(scoreboard.fack(), seq(10000));
}

#[test]
fn test_timeout_resets_both_sides() {
    init_tracing();
    let mut hooks = TestHooks::new(1000);

    let mut state = SendState::new(seq(0));
    state.snd_max = seq(5000);
    state.snd_nxt = seq(5000);
    state.snd_recover = seq(5000);
    let mut scoreboard = Scoreboard::new(SackConfig::default(), GlobalHoleBudget::new(1024));

    let mut report = SackReport::new();
    report.update(seq(0), seq(2000), seq(3000));

    assert!(scoreboard.process_ack(&state, seq(0), Some(&over_the_wire(&report)), &mut hooks));
    assert_eq!(scoreboard.num_holes(), 1);

    // Retransmission timeout: both sides of the connection drop their SACK
    // state and the sender rewinds snd_nxt.
    scoreboard.clear();
    report.clear();
    state.snd_nxt = seq(0);
    assert_eq!(scoreboard.num_holes(), 0);
    assert!(report.is_empty());
    assert_eq!(scoreboard.hint().sack_bytes_rexmit, 0);

    // The next SACKed range bootstraps a fresh scoreboard.
    assert!(scoreboard.process_ack(
        &state,
        seq(0),
        Some(&[SackBlock::new(seq(1000), seq(2000))]),
        &mut hooks,
    ));
    assert_eq!(hole_ranges(&scoreboard), vec![(0, 1000)]);
    assert_eq!(scoreboard.fack(), seq(2000));

    // After the rebuild, snd_nxt skips the freshly SACKed region.
    state.snd_nxt = seq(1000);
    scoreboard.adjust(&mut state);
    assert_eq!(state.snd_nxt, seq(2000));
}
