#![cfg(feature = "loom")]

use callflow::{Graph, Runner, ValueCell};
use loom::sync::Arc;
use loom::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn loom_cell_publication_is_visible_to_a_concurrent_reader() {
    loom::model(|| {
        let cell = Arc::new(ValueCell::new());
        let writer = {
            let cell = Arc::clone(&cell);
            loom::thread::spawn(move || {
                cell.set(7_u32).unwrap();
            })
        };
        // The reader blocks until the writer publishes, then observes the
        // exact stored value.
        assert_eq!(*cell.get().unwrap(), 7);
        writer.join().unwrap();
    });
}

#[test]
fn loom_chain_runs_each_node_exactly_once() {
    loom::model(|| {
        let counts = Arc::new([AtomicUsize::new(0), AtomicUsize::new(0)]);

        let mut graph = Graph::new();
        let first = Arc::clone(&counts);
        let a = graph.insert(move || {
            first[0].fetch_add(1, Ordering::Relaxed);
        });
        let second = Arc::clone(&counts);
        graph
            .connect(a, move || {
                second[1].fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();

        let mut runner = Runner::new(graph);
        runner.execute().wait().unwrap();

        assert_eq!(counts[0].load(Ordering::Relaxed), 1);
        assert_eq!(counts[1].load(Ordering::Relaxed), 1);
    });
}

#[test]
fn loom_fan_in_observes_both_parents() {
    loom::model(|| {
        let sum = Arc::new(AtomicUsize::new(0));

        let mut graph = Graph::new();
        let a = graph.insert(|| 1_usize);
        let b = graph.insert(|| 10_usize);
        let sink = Arc::clone(&sum);
        let c = graph
            .connect_to(
                a,
                move |i: usize, j: usize| {
                    sink.store(i + j, Ordering::Relaxed);
                },
                0,
            )
            .unwrap();
        graph.connect_to(b, c, 1).unwrap();

        let mut runner = Runner::new(graph);
        runner.execute().wait().unwrap();

        assert_eq!(sum.load(Ordering::Relaxed), 11);
    });
}
