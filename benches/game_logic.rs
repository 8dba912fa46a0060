use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tetrecs::core::{GamePiece, Grid, UniformPieces};
use tetrecs::engine::{Game, GameConfig};
use tetrecs::types::PieceKind;

fn bench_line_scan(c: &mut Criterion) {
    let mut grid = Grid::new(5, 5);
    for i in 0..5 {
        grid.set(i, 2, 1);
        grid.set(2, i, 1);
    }

    c.bench_function("scan_full_lines_cross", |b| {
        b.iter(|| black_box(&grid).scan_full_lines())
    });
}

fn bench_can_play_piece(c: &mut Criterion) {
    let grid = Grid::new(5, 5);
    let piece = GamePiece::new(PieceKind::Plus);

    c.bench_function("can_play_piece", |b| {
        b.iter(|| grid.can_play_piece(black_box(&piece), black_box(2), black_box(2)))
    });
}

fn bench_rotate(c: &mut Criterion) {
    let mut piece = GamePiece::new(PieceKind::C);

    c.bench_function("rotate_piece", |b| b.iter(|| piece.rotate()));
}

fn bench_piece_draw(c: &mut Criterion) {
    let mut pieces = UniformPieces::new(12345);

    c.bench_function("draw_piece", |b| b.iter(|| pieces.draw()));
}

fn bench_start_and_place(c: &mut Criterion) {
    c.bench_function("start_and_place", |b| {
        b.iter(|| {
            let mut game = Game::single_player(GameConfig::default(), 12345);
            game.start();
            for row in 0..5 {
                for col in 0..5 {
                    if game.block_clicked(col, row).is_placed() {
                        return game.score();
                    }
                }
            }
            game.score()
        })
    });
}

fn bench_flattened(c: &mut Criterion) {
    let mut grid = Grid::new(5, 5);
    for i in 0..25 {
        grid.set(i % 5, i / 5, i % 16);
    }
    let text = grid.flattened();

    c.bench_function("flatten_board", |b| b.iter(|| black_box(&grid).flattened()));
    c.bench_function("parse_board", |b| {
        b.iter(|| Grid::from_flattened(5, 5, black_box(&text)))
    });
}

criterion_group!(
    benches,
    bench_line_scan,
    bench_can_play_piece,
    bench_rotate,
    bench_piece_draw,
    bench_start_and_place,
    bench_flattened
);
criterion_main!(benches);
