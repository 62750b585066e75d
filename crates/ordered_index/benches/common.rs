use std::hint::black_box;
use std::time::{Duration, Instant};

use bench::{apply_medium_runtime_config, apply_small_runtime_config, default_rng, random_key_parts};
use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, BenchmarkId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ordered_index::{AvlTree, Key, OrderedIndex, PriorityQueue, SbTree, SkipList, TreapMap};

const SIZES: [usize; 4] = [1_000, 4_000, 16_000, 64_000];
const OPS_PER_ITER: usize = 200;
const SEARCH_HIT_RATE_PERCENT: u64 = 80;
const MIXED_INSERTS_PER_ITER: usize = OPS_PER_ITER / 10; // 10% inserts, 10% deletes, 80% searches.

#[derive(Clone)]
enum UpdateOp {
    Insert { key: Key, value: u64 },
    Delete { key: Key },
}

#[derive(Clone)]
enum MixedOp {
    Search { key: Key },
    Insert { key: Key, value: u64 },
    Delete { key: Key },
}

fn populate<M>(keys: &[Key], seed: u64) -> M
where
    M: OrderedIndex<Value = u64> + Default,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map = M::default();
    for key in keys {
        black_box(map.update(key.clone(), rng.random()));
    }
    map
}

pub fn bench_read<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedIndex<Value = u64> + Default,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let base_seed = seed_base(1, size as u64);
        let keys = generate_initial_keys(size, base_seed);
        let map: M = populate(&keys, base_seed ^ 0x11_22_33_44);

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for iter in 0..iters {
                    let mut rng = StdRng::seed_from_u64(seed_for_iter(base_seed, iter));
                    let ops = generate_search_keys(&keys, &mut rng);
                    let start = Instant::now();
                    for key in &ops {
                        black_box(map.search(key).copied());
                    }
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

pub fn bench_update<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedIndex<Value = u64> + Default,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let base_seed = seed_base(2, size as u64);
        let keys = generate_initial_keys(size, base_seed);
        let mut map: M = populate(&keys, base_seed ^ 0x55_66_77_88);

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for iter in 0..iters {
                    let mut rng = StdRng::seed_from_u64(seed_for_iter(base_seed, iter));
                    let ops = generate_update_ops(size, base_seed, iter, &mut rng);
                    let start = Instant::now();
                    run_update_ops(&mut map, ops);
                    black_box(map.len());
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

pub fn bench_mixed<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedIndex<Value = u64> + Default,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let base_seed = seed_base(3, size as u64);
        let keys = generate_initial_keys(size, base_seed);
        let mut map: M = populate(&keys, base_seed ^ 0x99_AA_BB_CC);

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for iter in 0..iters {
                    let mut rng = StdRng::seed_from_u64(seed_for_iter(base_seed, iter));
                    let ops = generate_mixed_ops(&keys, size, base_seed, iter, &mut rng);
                    let start = Instant::now();
                    run_mixed_ops(&mut map, ops);
                    black_box(map.len());
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

/// Positional access on the two engines that keep order statistics.
pub fn bench_all_select<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    for &size in &SIZES {
        apply_medium_runtime_config(group);
        let base_seed = seed_base(4, size as u64);
        let keys = generate_initial_keys(size, base_seed);
        let tree: SbTree<u64> = populate(&keys, base_seed);
        let list: SkipList<u64> = populate(&keys, base_seed);
        let mut rng = StdRng::seed_from_u64(base_seed);
        let ranks: Vec<usize> = (0..OPS_PER_ITER)
            .map(|_| rng.random_range(0..tree.len()))
            .collect();

        group.bench_function(BenchmarkId::new("sbt", size), |bencher| {
            bencher.iter(|| {
                for &i in &ranks {
                    let h = tree.index(i);
                    black_box(h.and_then(|h| tree.rank(h)));
                }
            })
        });
        group.bench_function(BenchmarkId::new("skiplist", size), |bencher| {
            bencher.iter(|| {
                for &i in &ranks {
                    let h = list.by_index(i);
                    black_box(h.and_then(|h| list.rank(h)));
                }
            })
        });
    }
}

pub fn bench_priority_queue<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let mut rng = default_rng();
        let weights: Vec<i64> = (0..size).map(|_| rng.random_range(0..1 << 20)).collect();

        group.bench_function(BenchmarkId::new("push_pop", size), |bencher| {
            bencher.iter(|| {
                let mut queue = PriorityQueue::new();
                for (i, &w) in weights.iter().enumerate() {
                    queue.push(w, i);
                }
                while let Some(top) = queue.pop() {
                    black_box(top);
                }
            })
        });
    }
}

fn generate_initial_keys(size: usize, base_seed: u64) -> Vec<Key> {
    let mut rng = StdRng::seed_from_u64(base_seed);
    (0..size)
        .map(|_| {
            let (n, s) = random_key_parts(&mut rng, 4 * size as i64);
            Key::new(n, s)
        })
        .collect()
}

fn random_key(rng: &mut StdRng, size: usize) -> Key {
    let (n, s) = random_key_parts(rng, 4 * size as i64);
    Key::new(n, s)
}

fn generate_search_keys(keys: &[Key], rng: &mut StdRng) -> Vec<Key> {
    (0..OPS_PER_ITER)
        .map(|_| {
            if rng.random_range(0..100) < SEARCH_HIT_RATE_PERCENT {
                keys[rng.random_range(0..keys.len())].clone()
            } else {
                random_key(rng, keys.len())
            }
        })
        .collect()
}

// Fresh keys live above the initial range so inserts never collide with it.
fn fresh_key(size: usize, base_seed: u64, id: u64) -> Key {
    let n = 4 * size as i64 + (mix_seed(base_seed ^ id) >> 2) as i64;
    Key::new(n, "")
}

fn generate_update_ops(size: usize, base_seed: u64, iter: u64, rng: &mut StdRng) -> Vec<UpdateOp> {
    let inserts = OPS_PER_ITER / 2;
    let mut inserted = Vec::with_capacity(inserts);
    let mut ops = Vec::with_capacity(OPS_PER_ITER);
    for i in 0..OPS_PER_ITER {
        if i % 2 == 0 {
            let id = iter.wrapping_mul(inserts as u64).wrapping_add((i / 2) as u64);
            let key = fresh_key(size, base_seed, id);
            inserted.push(key.clone());
            ops.push(UpdateOp::Insert {
                key,
                value: rng.random(),
            });
        } else {
            let idx = rng.random_range(0..inserted.len());
            let key = inserted.swap_remove(idx);
            ops.push(UpdateOp::Delete { key });
        }
    }
    debug_assert!(inserted.is_empty());
    ops
}

fn generate_mixed_ops(
    keys: &[Key],
    size: usize,
    base_seed: u64,
    iter: u64,
    rng: &mut StdRng,
) -> Vec<MixedOp> {
    let mut remaining_inserts = MIXED_INSERTS_PER_ITER;
    let mut remaining_deletes = MIXED_INSERTS_PER_ITER;
    let mut remaining_reads = OPS_PER_ITER - 2 * MIXED_INSERTS_PER_ITER;

    let mut live_inserted: Vec<Key> = Vec::with_capacity(MIXED_INSERTS_PER_ITER);
    let mut ops = Vec::with_capacity(OPS_PER_ITER);

    while ops.len() < OPS_PER_ITER {
        let remaining_slots = OPS_PER_ITER - ops.len();
        let do_read = if remaining_reads == 0 {
            false
        } else if remaining_inserts + remaining_deletes == 0 {
            true
        } else {
            rng.random_range(0..remaining_slots) < remaining_reads
        };

        if do_read {
            let key = if rng.random_range(0..100) < SEARCH_HIT_RATE_PERCENT {
                keys[rng.random_range(0..keys.len())].clone()
            } else {
                random_key(rng, size)
            };
            ops.push(MixedOp::Search { key });
            remaining_reads -= 1;
            continue;
        }

        let can_insert = remaining_inserts > 0;
        let can_delete = remaining_deletes > 0 && !live_inserted.is_empty();
        let do_delete = if !can_delete {
            false
        } else if !can_insert {
            true
        } else {
            rng.random_range(0..(remaining_inserts + remaining_deletes)) < remaining_deletes
        };

        if do_delete {
            let idx = rng.random_range(0..live_inserted.len());
            let key = live_inserted.swap_remove(idx);
            ops.push(MixedOp::Delete { key });
            remaining_deletes -= 1;
        } else {
            let insert_index = MIXED_INSERTS_PER_ITER - remaining_inserts;
            let id = iter
                .wrapping_mul(MIXED_INSERTS_PER_ITER as u64)
                .wrapping_add(insert_index as u64);
            let key = fresh_key(size, base_seed, id);
            live_inserted.push(key.clone());
            ops.push(MixedOp::Insert {
                key,
                value: rng.random(),
            });
            remaining_inserts -= 1;
        }
    }

    debug_assert!(live_inserted.is_empty());
    ops
}

fn run_update_ops<M>(map: &mut M, ops: Vec<UpdateOp>)
where
    M: OrderedIndex<Value = u64>,
{
    for op in ops {
        match op {
            UpdateOp::Insert { key, value } => {
                black_box(map.update(key, value));
            }
            UpdateOp::Delete { key } => {
                black_box(map.delete(&key));
            }
        }
    }
}

fn run_mixed_ops<M>(map: &mut M, ops: Vec<MixedOp>)
where
    M: OrderedIndex<Value = u64>,
{
    for op in ops {
        match op {
            MixedOp::Search { key } => {
                black_box(map.search(&key).copied());
            }
            MixedOp::Insert { key, value } => {
                black_box(map.update(key, value));
            }
            MixedOp::Delete { key } => {
                black_box(map.delete(&key));
            }
        }
    }
}

fn seed_base(workload_id: u64, size: u64) -> u64 {
    mix_seed(0x0DDB_A11A_2026_0000_u64 ^ (workload_id << 48) ^ size)
}

fn seed_for_iter(base: u64, iter: u64) -> u64 {
    mix_seed(base ^ iter.wrapping_mul(SEED_MIX))
}

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

fn mix_seed(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub fn bench_all_read<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_read::<AvlTree<u64>, _>(group, "avl");
    bench_read::<SbTree<u64>, _>(group, "sbt");
    bench_read::<TreapMap<u64>, _>(group, "treap");
    bench_read::<SkipList<u64>, _>(group, "skiplist");
}

pub fn bench_all_mixed<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_mixed::<AvlTree<u64>, _>(group, "avl");
    bench_mixed::<SbTree<u64>, _>(group, "sbt");
    bench_mixed::<TreapMap<u64>, _>(group, "treap");
    bench_mixed::<SkipList<u64>, _>(group, "skiplist");
}

pub fn bench_all_update<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_update::<AvlTree<u64>, _>(group, "avl");
    bench_update::<SbTree<u64>, _>(group, "sbt");
    bench_update::<TreapMap<u64>, _>(group, "treap");
    bench_update::<SkipList<u64>, _>(group, "skiplist");
}
