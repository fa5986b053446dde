use std::hint::black_box;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use shellbox_vfs::{Clock, FileSystem, FsOptions, NoCache, SystemClock, WriteMode, populate_demo_tree};

fn wide_tree(fs: &mut FileSystem) {
    fs.create_directory_all("/bench").unwrap();
    for i in 0..500 {
        fs.write_file(&format!("/bench/file_{i}"), "payload", WriteMode::Overwrite)
            .unwrap();
    }
}

fn listing(c: &mut Criterion) {
    let mut cached = FileSystem::in_memory(FsOptions::default());
    wide_tree(&mut cached);
    c.bench_function("list 500 entries (ttl cache)", |b| {
        b.iter(|| black_box(cached.directory_contents(Some("/bench"))))
    });

    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let mut uncached = FileSystem::new(FsOptions::default(), clock, Box::new(NoCache));
    wide_tree(&mut uncached);
    c.bench_function("list 500 entries (no cache)", |b| {
        b.iter(|| black_box(uncached.directory_contents(Some("/bench"))))
    });
}

fn resolve_and_read(c: &mut Criterion) {
    let mut fs = FileSystem::in_memory(FsOptions::default());
    populate_demo_tree(&mut fs).unwrap();
    c.bench_function("read through ../ segments", |b| {
        b.iter(|| black_box(fs.file_content("../favork/./Documents/../Documents/notes.txt")))
    });
    c.bench_function("statistics", |b| b.iter(|| black_box(fs.statistics())));
}

criterion_group!(benches, listing, resolve_and_read);
criterion_main!(benches);
