use moltraj::file::OpenMode;
use moltraj::model::{Atom, Topology, UnitCell};
use moltraj::{geometry, Frame, Selection, Trajectory, Vector3D};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("moltraj-it-{}-{name}", std::process::id()))
}

fn water() -> Frame {
    let mut frame = Frame::new();
    frame.add_atom(Atom::from_element("O"), Vector3D::new(0.0, 0.0, 0.0), None);
    frame.add_atom(Atom::from_element("H"), Vector3D::new(0.96, 0.0, 0.0), None);
    frame.add_atom(Atom::from_element("H"), Vector3D::new(-0.24, 0.93, 0.0), None);
    frame
}

#[test]
fn xyz_round_trip_through_trajectory() {
    let path = temp_path("water.xyz");
    {
        let mut traj = Trajectory::open(&path, OpenMode::Write).unwrap();
        traj.write(&water()).unwrap();
    }
    let mut traj = Trajectory::open(&path, OpenMode::Read).unwrap();
    let frame = traj.read().unwrap();
    assert_eq!(frame.size(), 3);
    assert_eq!(frame.positions()[1].x(), 0.96);
    std::fs::remove_file(path).ok();
}

#[test]
fn gro_round_trip_converts_units() {
    let path = temp_path("water.gro");
    let mut original = water();
    original.set_cell(UnitCell::orthorhombic(20.0, 20.0, 20.0));
    {
        let mut traj = Trajectory::open(&path, OpenMode::Write).unwrap();
        traj.write(&original).unwrap();
    }
    let mut traj = Trajectory::open(&path, OpenMode::Read).unwrap();
    let frame = traj.read().unwrap();
    assert_eq!(frame.size(), 3);
    assert!((frame.cell().lengths().0 - 20.0).abs() < 1e-6);
    std::fs::remove_file(path).ok();
}

#[test]
fn multi_frame_sequential_read_then_eof() {
    let path = temp_path("multi.xyz");
    {
        let mut traj = Trajectory::open(&path, OpenMode::Write).unwrap();
        for step in 0..3 {
            let mut frame = water();
            frame.set_step(step);
            traj.write(&frame).unwrap();
        }
    }
    let mut traj = Trajectory::open(&path, OpenMode::Read).unwrap();
    for expected_step in 0..3 {
        let frame = traj.read().unwrap();
        assert_eq!(frame.step(), expected_step);
    }
    assert!(traj.read().is_err());
    assert!(traj.done());
    std::fs::remove_file(path).ok();
}

#[test]
fn random_access_read_step_matches_sequential() {
    let path = temp_path("random.xyz");
    {
        let mut traj = Trajectory::open(&path, OpenMode::Write).unwrap();
        for step in 0..4 {
            let mut frame = water();
            frame.positions_mut()[0] = Vector3D::new(step as f64, 0.0, 0.0);
            traj.write(&frame).unwrap();
        }
    }
    let mut traj = Trajectory::open(&path, OpenMode::Read).unwrap();
    let frame = traj.read_step(2).unwrap();
    assert_eq!(frame.positions()[0].x(), 2.0);
    std::fs::remove_file(path).ok();
}

#[test]
fn compressed_round_trip() {
    let path = temp_path("water.xyz.gz");
    {
        let mut traj = Trajectory::open(&path, OpenMode::Write).unwrap();
        traj.write(&water()).unwrap();
    }
    let mut traj = Trajectory::open(&path, OpenMode::Read).unwrap();
    let frame = traj.read().unwrap();
    assert_eq!(frame.size(), 3);
    std::fs::remove_file(path).ok();
}

#[test]
fn topology_override_from_another_file() {
    let topo_path = temp_path("topo.xyz");
    let traj_path = temp_path("traj.xyz");
    {
        let mut traj = Trajectory::open(&topo_path, OpenMode::Write).unwrap();
        let mut frame = water();
        frame.topology_mut().add_bond(0, 1).unwrap();
        frame.topology_mut().add_bond(0, 2).unwrap();
        traj.write(&frame).unwrap();
    }
    {
        let mut traj = Trajectory::open(&traj_path, OpenMode::Write).unwrap();
        traj.write(&water()).unwrap();
    }

    let mut traj = Trajectory::open(&traj_path, OpenMode::Read).unwrap();
    traj.set_topology_from(&topo_path, None).unwrap();
    let frame = traj.read().unwrap();
    assert!(frame.topology().is_bonded(0, 1));
    assert!(frame.topology().is_bonded(0, 2));

    std::fs::remove_file(topo_path).ok();
    std::fs::remove_file(traj_path).ok();
}

#[test]
fn guess_topology_then_selection_finds_bonded_pairs() {
    let mut frame = water();
    geometry::guess_topology(&mut frame).unwrap();
    assert!(frame.topology().is_bonded(0, 1));
    assert!(frame.topology().is_bonded(0, 2));

    let selection = Selection::compile("is_bonded(i, j)", 2).unwrap();
    let pairs = selection.evaluate(&mut frame).unwrap();
    assert!(pairs.contains(&vec![0, 1]));
}

#[test]
fn resize_down_then_up_keeps_positions_topology_in_lockstep() {
    let mut frame = water();
    frame.topology_mut().add_bond(0, 1).unwrap();
    frame.resize(0);
    assert_eq!(frame.size(), 0);
    assert_eq!(frame.topology().bond_count(), 0);

    frame.resize(2);
    assert_eq!(frame.size(), 2);
    assert_eq!(frame.positions().len(), 2);
}

#[test]
fn selection_rejects_predicate_below_its_required_arity() {
    assert!(Selection::compile("is_dihedral(i, j, k, m)", 3).is_err());
    assert!(Selection::compile("is_dihedral(i, j, k, m)", 4).is_ok());
}

#[test]
fn selection_syntax_error_reports_offset() {
    let err = Selection::compile("name ==", 1).unwrap_err();
    match err {
        moltraj::Error::SelectionError { .. } => {}
        other => panic!("expected SelectionError, got {other:?}"),
    }
}

#[test]
fn unknown_topology_placeholder_autoresizes_on_set() {
    let mut frame = water();
    let topology = Topology::new();
    // An empty placeholder topology auto-resizes to the frame's atom count.
    frame.set_topology(topology).unwrap();
    assert_eq!(frame.topology().atom_count(), 3);
}
