use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use moltraj::file::{Compression, OpenMode, Substrate};
use moltraj::model::Atom;
use moltraj::registry::format_by_name;
use moltraj::Vector3D;
use moltraj::{Frame, Selection};

fn xyz_path(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("moltraj-bench-{tag}-{}.xyz", std::process::id()))
}

fn write_xyz_fixture(path: &std::path::Path, natoms: usize) {
    let mut frame = Frame::new();
    for i in 0..natoms {
        frame.add_atom(
            Atom::from_element("C"),
            Vector3D::new(i as f64, (i * 2) as f64, (i * 3) as f64),
            None,
        );
    }
    let mut substrate = Substrate::open(path, OpenMode::Write, Compression::None).unwrap();
    let mut format = format_by_name("XYZ", OpenMode::Write).unwrap();
    format.write(&mut substrate, &frame).unwrap();
}

fn bench_xyz_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("xyz_read");
    for natoms in [100usize, 10_000] {
        let path = xyz_path(&format!("read-{natoms}"));
        write_xyz_fixture(&path, natoms);
        group.throughput(Throughput::Elements(natoms as u64));
        group.bench_function(format!("{natoms}_atoms"), |b| {
            b.iter_batched(
                || Substrate::open(&path, OpenMode::Read, Compression::None).unwrap(),
                |mut substrate| {
                    let mut format = format_by_name("XYZ", OpenMode::Read).unwrap();
                    format.index(&mut substrate).unwrap();
                    format.read(&mut substrate).unwrap()
                },
                BatchSize::SmallInput,
            )
        });
        std::fs::remove_file(&path).ok();
    }
    group.finish();
}

fn bench_selection_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection_evaluate");
    for natoms in [100usize, 1_000] {
        let mut frame = Frame::new();
        for i in 0..natoms {
            frame.add_atom(Atom::from_element("C"), Vector3D::new(i as f64, 0.0, 0.0), None);
        }
        let selection = Selection::compile("index >= 10 and mass > 1.0", 1).unwrap();
        group.throughput(Throughput::Elements(natoms as u64));
        group.bench_function(format!("{natoms}_atoms"), |b| {
            b.iter(|| selection.select_atoms(&mut frame).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_xyz_read, bench_selection_evaluate);
criterion_main!(benches);
