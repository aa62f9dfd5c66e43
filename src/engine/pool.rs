//! Bounded worker pool over scoped OS threads.
//!
//! Workers pull jobs off a shared queue and send indexed results over a
//! channel, so output order always matches input order no matter which
//! worker finishes first.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Run `f` over every item on up to `workers` threads, returning results
/// in input order.
pub fn map_ordered<T, R, F>(items: Vec<T>, workers: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, items.len());

    let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
    let (tx, rx) = mpsc::channel::<(usize, R)>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let f = &f;
            scope.spawn(move || loop {
                let job = queue.lock().pop_front();
                match job {
                    Some((idx, item)) => {
                        if tx.send((idx, f(item))).is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            });
        }
    });
    drop(tx);

    let mut results: Vec<(usize, R)> = rx.into_iter().collect();
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, result)| result).collect()
}

/// Like [`map_ordered`], but dispatching `chunk_size` items at a time
/// with a fixed pause between chunks to bound pressure on the far end.
/// No pause follows the final chunk.
pub fn map_chunked<T, R, F>(
    items: Vec<T>,
    workers: usize,
    chunk_size: usize,
    delay: Duration,
    f: F,
) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let chunk_size = chunk_size.max(1);
    let total = items.len();
    let mut results = Vec::with_capacity(total);

    let mut remaining = items;
    while !remaining.is_empty() {
        let rest = remaining.split_off(remaining.len().min(chunk_size));
        let chunk = std::mem::replace(&mut remaining, rest);
        results.extend(map_ordered(chunk, workers, |item| f(item)));
        if !remaining.is_empty() && !delay.is_zero() {
            thread::sleep(delay);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn empty_input_yields_empty_output() {
        let out: Vec<u32> = map_ordered(Vec::<u32>::new(), 4, |x| x);
        assert!(out.is_empty());
    }

    #[test]
    fn results_follow_input_order() {
        // Stagger work so later items finish first
        let items: Vec<u64> = (0..20).collect();
        let out = map_ordered(items, 8, |i| {
            thread::sleep(Duration::from_millis(20 - i));
            i * 2
        });
        assert_eq!(out, (0..20).map(|i| i * 2).collect::<Vec<u64>>());
    }

    #[test]
    fn worker_count_exceeding_items_is_harmless() {
        let out = map_ordered(vec![1, 2, 3], 100, |x| x + 1);
        assert_eq!(out, vec![2, 3, 4]);
    }

    #[test]
    fn every_item_runs_exactly_once() {
        let calls = AtomicUsize::new(0);
        let out = map_ordered((0..57).collect(), 15, |i: usize| {
            calls.fetch_add(1, Ordering::SeqCst);
            i
        });
        assert_eq!(out.len(), 57);
        assert_eq!(calls.load(Ordering::SeqCst), 57);
    }

    #[test]
    fn chunked_matches_plain_map() {
        let items: Vec<u32> = (0..45).collect();
        let plain = map_ordered(items.clone(), 4, |x| x * x);
        let chunked = map_chunked(items, 4, 20, Duration::ZERO, |x| x * x);
        assert_eq!(plain, chunked);
    }

    #[test]
    fn chunked_handles_short_final_chunk() {
        let out = map_chunked((0..7).collect(), 3, 3, Duration::ZERO, |x: u32| x);
        assert_eq!(out, (0..7).collect::<Vec<u32>>());
    }
}
