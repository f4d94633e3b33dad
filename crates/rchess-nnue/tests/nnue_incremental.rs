//! 差分更新と全計算の一致テスト

mod common;

use common::{TestBoard, assert_close, synthetic_network};
use rchess_nnue::nnue::{
    AccumulatorStack, ArchitectureSpec, EncodingKind, Evaluator, Network, PropagationBuffers,
};
use rchess_nnue::position::BoardState;
use rchess_nnue::types::Color;
use std::sync::Arc;

const TOLERANCE: f32 = 1e-4;

fn spec(encoding: EncodingKind) -> ArchitectureSpec {
    ArchitectureSpec::new(encoding, 32).with_hidden(&[16, 8])
}

/// 新しいスタックで全計算した評価値とスタック
fn refresh_eval(network: &Network, board: BoardState) -> (f32, AccumulatorStack) {
    let mut stack = network.new_stack();
    stack.reset(board);
    let mut buffers = PropagationBuffers::new(network);
    let value = network.evaluate(&mut stack, &mut buffers);
    (value, stack)
}

fn assert_matches_refresh(evaluator: &mut Evaluator, board: &TestBoard) {
    let value = evaluator.evaluate();
    let (expected, fresh) = refresh_eval(evaluator.network(), board.state());
    assert!((value - expected).abs() <= TOLERANCE, "{value} vs {expected}");
    for color in Color::ALL {
        assert_close(
            evaluator.stack().current().accumulator.get(color),
            fresh.current().accumulator.get(color),
            TOLERANCE,
        );
    }
}

#[test]
fn test_five_move_sequence_matches_refresh() {
    for encoding in [EncodingKind::Mobility, EncodingKind::CompressedMobility] {
        let network = Arc::new(synthetic_network(spec(encoding), 0x5EED));
        let mut board = TestBoard::startpos();
        let mut evaluator = Evaluator::new(network, board.state());
        assert_matches_refresh(&mut evaluator, &board);

        for mv in ["e2e4", "e7e5", "g1f3", "b8c6", "e1e2"] {
            let dirty = board.make_uci(mv);
            evaluator.push(board.state(), dirty);
            assert_matches_refresh(&mut evaluator, &board);
        }

        // ルートの全計算以降は、玉移動の1視点を除いてすべて差分更新
        let stats = evaluator.stats();
        assert_eq!(stats.refresh_count, 2 + 1);
        assert_eq!(stats.incremental_count, 2 * 5 - 1);
    }
}

#[test]
fn test_king_move_refreshes_only_own_perspective() {
    let network = Arc::new(synthetic_network(spec(EncodingKind::Mobility), 7));
    let mut board = TestBoard::startpos();
    let mut evaluator = Evaluator::new(network, board.state());
    evaluator.evaluate();

    for mv in ["e2e4", "e7e5"] {
        let dirty = board.make_uci(mv);
        evaluator.push(board.state(), dirty);
        evaluator.evaluate();
    }
    let before = *evaluator.stats();

    let dirty = board.make_uci("e1e2");
    assert!(dirty.king_moved(Color::White));
    evaluator.push(board.state(), dirty);
    evaluator.evaluate();

    let after = *evaluator.stats();
    assert_eq!(after.refresh_count - before.refresh_count, 1);
    assert_eq!(after.incremental_count - before.incremental_count, 1);
}

#[test]
fn test_lazy_multi_ply_update() {
    let network = Arc::new(synthetic_network(spec(EncodingKind::Mobility), 11));
    let mut board = TestBoard::startpos();
    let mut evaluator = Evaluator::new(network, board.state());
    evaluator.evaluate();

    // 評価せずに3手進める
    for mv in ["d2d4", "d7d5", "c1f4"] {
        let dirty = board.make_uci(mv);
        evaluator.push(board.state(), dirty);
    }
    assert_matches_refresh(&mut evaluator, &board);

    let stack = evaluator.stack();
    for color in Color::ALL {
        assert!(stack.entry_at(1).accumulator.is_computed(color));
        assert!(!stack.entry_at(2).accumulator.is_computed(color));
        assert!(stack.entry_at(3).accumulator.is_computed(color));
    }
    assert_eq!(evaluator.stats().incremental_count, 2);
}

#[test]
fn test_capture_sequence_matches_refresh() {
    for encoding in [EncodingKind::Mobility, EncodingKind::CompressedMobility] {
        let network = Arc::new(synthetic_network(spec(encoding), 23));
        let mut board = TestBoard::startpos();
        let mut evaluator = Evaluator::new(network, board.state());
        evaluator.evaluate();

        for mv in ["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a2"] {
            let dirty = board.make_uci(mv);
            evaluator.push(board.state(), dirty);
            assert_matches_refresh(&mut evaluator, &board);
        }
        assert_eq!(board.state().piece_count, 29);
    }
}

#[test]
fn test_evaluate_is_idempotent() {
    let network = Arc::new(synthetic_network(spec(EncodingKind::CompressedMobility), 3));
    let mut board = TestBoard::startpos();
    let mut evaluator = Evaluator::new(network, board.state());
    evaluator.evaluate();
    let dirty = board.make_uci("g1f3");
    evaluator.push(board.state(), dirty);

    let first = evaluator.evaluate();
    let rows = evaluator.stats().rows_applied;
    let second = evaluator.evaluate();
    assert_eq!(first, second);
    assert_eq!(evaluator.stats().rows_applied, rows);
    assert_eq!(evaluator.stats().already_computed_count, 2);
}

#[test]
fn test_pop_restores_previous_evaluation() {
    let network = Arc::new(synthetic_network(spec(EncodingKind::Mobility), 99));
    let mut board = TestBoard::startpos();
    let mut evaluator = Evaluator::new(network, board.state());
    let root = evaluator.evaluate();

    let dirty = board.make_uci("b1c3");
    evaluator.push(board.state(), dirty);
    let child = evaluator.evaluate();
    evaluator.pop();

    assert_eq!(evaluator.evaluate(), root);
    assert_eq!(evaluator.stack().current_index(), 0);

    // 同じ手を再度プッシュしても結果は同じ
    evaluator.push(board.state(), dirty);
    assert_eq!(evaluator.evaluate(), child);
}

#[test]
fn test_null_move_reuses_parent() {
    let network = Arc::new(synthetic_network(spec(EncodingKind::Mobility), 5));
    let board = TestBoard::startpos();
    let mut evaluator = Evaluator::new(network, board.state());
    evaluator.evaluate();

    let mut state = board.state();
    state.side_to_move = Color::Black;
    evaluator.push(state, Default::default());
    evaluator.evaluate();

    let stack = evaluator.stack();
    for color in Color::ALL {
        assert_eq!(
            stack.entry_at(0).accumulator.get(color),
            stack.current().accumulator.get(color)
        );
    }
    assert_eq!(evaluator.stats().rows_applied, 2 * 32);
}
