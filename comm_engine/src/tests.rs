use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

use crate::{CommEngine, ThreadComm};

#[test]
fn test_single_rank() {
    let results = ThreadComm::launch(1, |comm| {
        assert_eq!(comm.size(), 1);
        assert_eq!(comm.rank(), 0);
        assert!(comm.is_root());
        assert!(comm.is_single_process());

        let mut buf = vec![1.5, 2.5];
        comm.broadcast_f64(&mut buf, 0);
        (comm.all_reduce_sum_f64(&[3.0]), buf)
    })
    .unwrap();

    assert_eq!(results, vec![(vec![3.0], vec![1.5, 2.5])]);
}

#[test]
fn test_all_reduce_sum() {
    const WORLD_SIZE: usize = 4;

    let results = ThreadComm::launch(WORLD_SIZE, |comm| {
        let rank = comm.rank();
        let floats = comm.all_reduce_sum_f64(&[rank as f64, 1.0]);
        let ints = comm.all_reduce_sum_i64(&[rank as i64, -(rank as i64)]);
        (floats, ints)
    })
    .unwrap();

    for (floats, ints) in results {
        assert_eq!(floats, vec![6.0, 4.0]);
        assert_eq!(ints, vec![6, -6]);
    }
}

#[test]
fn test_all_reduce_sum_in_place_and_wrapping() {
    let results = ThreadComm::launch(2, |comm| {
        let mut buf = vec![comm.rank() as f64, 0.5];
        comm.all_reduce_sum_f64_in_place(&mut buf);
        // i64::MAX + 1 wraps, as MPI_SUM does
        let ints = comm.all_reduce_sum_i64(&[if comm.rank() == 0 { i64::MAX } else { 1 }]);
        (buf, ints)
    })
    .unwrap();

    for (buf, ints) in results {
        assert_eq!(buf, vec![1.0, 1.0]);
        assert_eq!(ints, vec![i64::MIN]);
    }
}

#[test]
fn test_all_reduce_sum_is_identical_on_every_rank() {
    const WORLD_SIZE: usize = 5;
    const LEN: usize = 257;

    let results = ThreadComm::launch(WORLD_SIZE, |comm| {
        let mut rng = ChaCha8Rng::seed_from_u64(comm.rank() as u64);
        let local = (0..LEN).map(|_| rng.gen::<f64>()).collect::<Vec<_>>();
        comm.all_reduce_sum_f64(&local)
    })
    .unwrap();

    // bitwise identical, not only close
    let first = results[0].iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    for result in &results[1..] {
        assert_eq!(first, result.iter().map(|x| x.to_bits()).collect::<Vec<_>>());
    }
}

#[test]
fn test_all_reduce_and() {
    let all_true = ThreadComm::launch(3, |comm| comm.all_reduce_and(true)).unwrap();
    assert!(all_true.into_iter().all(|b| b));

    let one_false = ThreadComm::launch(3, |comm| comm.all_reduce_and(comm.rank() != 2)).unwrap();
    assert!(one_false.into_iter().all(|b| !b));
}

#[test]
fn test_broadcast_resizes() {
    const ROOT: usize = 2;

    let results = ThreadComm::launch(4, |comm| {
        let mut floats = if comm.rank() == ROOT {
            vec![0.25, 0.5, 0.75]
        } else {
            vec![comm.rank() as f64]
        };
        let mut ints = vec![comm.rank() as i64; comm.rank()];
        comm.broadcast_f64(&mut floats, ROOT);
        comm.broadcast_i64(&mut ints, ROOT);
        (floats, ints)
    })
    .unwrap();

    for (floats, ints) in results {
        assert_eq!(floats, vec![0.25, 0.5, 0.75]);
        assert_eq!(ints, vec![2, 2]);
    }
}

#[test]
fn test_all_gather_varlen() {
    let results = ThreadComm::launch(3, |comm| {
        let local = (0..=comm.rank()).map(|i| i as f64).collect::<Vec<_>>();
        comm.all_gather_f64(&local)
    })
    .unwrap();

    for gathered in results {
        assert_eq!(gathered, vec![vec![0.0], vec![0.0, 1.0], vec![0.0, 1.0, 2.0]]);
    }
}

#[test]
fn test_split_orders_by_key() {
    // color = rank % 2, key reverses the order inside each color
    let results = ThreadComm::launch(6, |comm| {
        let color = comm.rank() % 2;
        let key = 10 - comm.rank();
        let sub = comm.split(color, key);
        let ranks = sub.all_gather_f64(&[comm.rank() as f64]);
        (sub.size(), sub.rank(), ranks)
    })
    .unwrap();

    assert_eq!(results[0], (3, 2, vec![vec![4.0], vec![2.0], vec![0.0]]));
    assert_eq!(results[1], (3, 2, vec![vec![5.0], vec![3.0], vec![1.0]]));
    assert_eq!(results[4].1, 0);
    assert_eq!(results[5].1, 0);
}

#[test]
fn test_split_groups_are_independent() {
    let results = ThreadComm::launch(4, |comm| {
        let first = comm.split(comm.rank() / 2, comm.rank());
        let second = comm.split(comm.rank() % 2, comm.rank());

        // interleave traffic on both subgroups and the parent
        let a = first.all_reduce_sum_i64(&[comm.rank() as i64]);
        let b = second.all_reduce_sum_i64(&[comm.rank() as i64]);
        comm.barrier();
        let c = comm.all_reduce_sum_i64(&[1]);
        (a[0], b[0], c[0])
    })
    .unwrap();

    assert_eq!(results, vec![(1, 2, 4), (1, 4, 4), (5, 2, 4), (5, 4, 4)]);
}
