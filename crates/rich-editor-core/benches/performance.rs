use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rich_editor_core::{
    BlockType, CompositeDecorator, ContentBlock, ContentState, Decorator, EditCommand,
    EditorState, EditorStatePatch, FnStrategy, SelectionState,
};
use std::sync::Arc;

fn large_document(block_count: usize) -> ContentState {
    ContentState::create_from_blocks((0..block_count).map(|i| {
        ContentBlock::new(
            format!("b{i}"),
            BlockType::Unstyled,
            format!("{i:06} the quick brown fox jumps over the lazy dog #{i}"),
        )
    }))
}

fn hash_decorator(marker: char) -> Arc<dyn Decorator> {
    Arc::new(CompositeDecorator::default().with_strategy(FnStrategy::new(
        "marker",
        move |block: &ContentBlock, found: &mut dyn FnMut(usize, usize)| {
            for (i, c) in block.text().chars().enumerate() {
                if c == marker {
                    found(i, i + 1);
                }
            }
        },
    )))
}

fn bench_create(c: &mut Criterion) {
    let content = large_document(10_000);
    let decorator = hash_decorator('#');
    c.bench_function("create/10k_blocks", |b| {
        b.iter(|| {
            let state =
                EditorState::create_with_content(black_box(content.clone()), Some(decorator.clone()));
            black_box(state.tree_map().len());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let state = EditorState::create_with_content(large_document(10_000), Some(hash_decorator('#')))
        .accept_selection(SelectionState::collapsed("b5000".into(), 0));
    c.bench_function("typing_middle/100_inserts", |b| {
        b.iter_batched(
            || state.clone(),
            |mut state| {
                for _ in 0..100 {
                    state = state
                        .execute(EditCommand::InsertText("x".to_string()))
                        .unwrap();
                }
                black_box(state.undo_stack().len());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_undo_redo_cycle(c: &mut Criterion) {
    let mut state = EditorState::create_with_content(large_document(10_000), None)
        .accept_selection(SelectionState::collapsed("b100".into(), 3));
    for _ in 0..50 {
        state = state.execute(EditCommand::SplitBlock).unwrap();
    }
    c.bench_function("undo_redo/50_splits", |b| {
        b.iter(|| {
            let mut current = state.clone();
            while current.can_undo() {
                current = current.undo();
            }
            while current.can_redo() {
                current = current.redo();
            }
            black_box(current.tree_map().len());
        })
    });
}

fn bench_decorator_swap(c: &mut Criterion) {
    let state = EditorState::create_with_content(large_document(10_000), Some(hash_decorator('#')));
    let next = hash_decorator('q');
    c.bench_function("decorator_swap/10k_blocks", |b| {
        b.iter(|| {
            let swapped = state.set(EditorStatePatch::new().with_decorator(Some(next.clone())));
            black_box(swapped.tree_map().len());
        })
    });
}

criterion_group!(
    benches,
    bench_create,
    bench_typing_in_middle,
    bench_undo_redo_cycle,
    bench_decorator_swap
);
criterion_main!(benches);
