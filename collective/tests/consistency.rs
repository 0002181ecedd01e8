use collective::{
    check_mesh_consistent_partitioning, check_space_consistent_partitioning, split_communicators,
    Collective, CollectiveError, GridCollective, IntervalMesh, NullCollective,
};
use comm_engine::{CommEngine, ThreadComm};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_identical_partitions_pass() {
    init_logger();

    // 3 subdomains x 2 instances, every instance balances 10 cells the same way
    let results = ThreadComm::launch(6, |world| {
        let split = split_communicators(&world, 3, 2).unwrap();
        let mesh = IntervalMesh::new(split.mesh, 10).unwrap();
        let collective = GridCollective::new(split.collective);
        check_mesh_consistent_partitioning(&mesh, &collective, &world).unwrap()
    })
    .unwrap();

    assert_eq!(results, vec![true; 6]);
}

#[test]
fn test_one_diverging_instance_fails_everywhere() {
    init_logger();

    // instance 1 cuts the mesh at cell 4 instead of cell 5
    let results = ThreadComm::launch(4, |world| {
        let split = split_communicators(&world, 2, 2).unwrap();
        let instance = split.grid.address(world.rank()).key;
        let counts = if instance == 1 { [4, 6] } else { [5, 5] };
        let mesh = IntervalMesh::with_cell_counts(split.mesh, &counts).unwrap();
        let collective = GridCollective::new(split.collective);
        check_mesh_consistent_partitioning(&mesh, &collective, &world).unwrap()
    })
    .unwrap();

    assert_eq!(results, vec![false; 4]);
}

#[test]
fn test_vertex_space_alone() {
    init_logger();

    let results = ThreadComm::launch(4, |world| {
        let split = split_communicators(&world, 2, 2).unwrap();
        let mesh = IntervalMesh::new(split.mesh, 7).unwrap();
        let collective = GridCollective::new(split.collective);
        check_space_consistent_partitioning(&mesh.vertex_space(), &collective, &world).unwrap()
    })
    .unwrap();

    assert_eq!(results, vec![true; 4]);
}

#[test]
fn test_single_instance_with_null_collective() {
    init_logger();

    let results = ThreadComm::launch(2, |world| {
        let split = split_communicators(&world, 2, 1).unwrap();
        assert_eq!(split.collective.size(), 1);
        let mesh = IntervalMesh::new(split.mesh, 5).unwrap();
        check_mesh_consistent_partitioning(&mesh, &NullCollective, &world).unwrap()
    })
    .unwrap();

    assert_eq!(results, vec![true; 2]);
}

#[test]
fn test_checker_accepts_collective_trait_objects() {
    init_logger();

    let results = ThreadComm::launch(2, |world| {
        let split = split_communicators(&world, 1, 2).unwrap();
        let mesh = IntervalMesh::new(split.mesh, 3).unwrap();
        let collective: Box<dyn Collective> = Box::new(GridCollective::new(split.collective));
        check_mesh_consistent_partitioning(&mesh, collective.as_ref(), &world).unwrap()
    })
    .unwrap();

    assert_eq!(results, vec![true; 2]);
}

#[test]
fn test_grid_mismatch_reported_before_splitting() {
    init_logger();

    let results = ThreadComm::launch(4, |world| {
        match split_communicators(&world, 3, 2) {
            Err(CollectiveError::Configuration {
                world_size,
                n_subdomain,
                n_instance,
            }) => (world_size, n_subdomain, n_instance),
            other => panic!("unexpected {other:?}"),
        }
    })
    .unwrap();

    assert_eq!(results, vec![(4, 3, 2); 4]);
}
