//! Host harness: formats an emulated volume, replays a synthetic
//! workload single-threaded and multi-threaded under the read/write
//! gate, and prints the tree dump.

mod cli;
mod workload;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use clap::Parser;

use cli::Cli;
use emu_fs::gate::RwGate;
use emu_fs::{DirFd, EmuFileSystem, EntityKind, FsError, MemDisk, MAX_FILE_SIZE};
use workload::{Op, FILES};

fn main() -> Result<(), FsError> {
    env_logger::init();
    let cli = Cli::parse();

    let mut fs = EmuFileSystem::new(MemDisk::new());
    let id = fs.mount(&cli.label, cli.blocks)?;
    fs.format(id, 0)?;

    let root = fs.open_root(id)?;
    seed_files(&mut fs, root)?;

    let ops = workload::generate(cli.requests, cli.seed);
    let fs = Arc::new(Mutex::new(fs));
    let gate = Arc::new(RwGate::new());

    let start = Instant::now();
    for op in &ops {
        apply(&fs, &gate, root, op);
    }
    let sequential = start.elapsed();

    let start = Instant::now();
    let workers: Vec<_> = ops
        .chunks(ops.len().div_ceil(cli.threads.max(1)).max(1))
        .map(|chunk| {
            let fs = fs.clone();
            let gate = gate.clone();
            let chunk = chunk.to_vec();
            thread::spawn(move || {
                for op in &chunk {
                    apply(&fs, &gate, root, op);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }
    let concurrent = start.elapsed();

    println!("sequential: {sequential:?}");
    println!("concurrent: {concurrent:?} ({} threads)", cli.threads);
    let mut fs = fs.lock().unwrap();
    print!("{}", fs.dump(id)?);
    fs.unmount(id)?;

    Ok(())
}

/// Creates `file1..file4` and fills each to capacity, the workload
/// then reads and overwrites them.
fn seed_files(fs: &mut EmuFileSystem<MemDisk>, root: DirFd) -> Result<(), FsError> {
    for name in FILES {
        fs.create(root, name, EntityKind::File)?;
        let fd = fs.open_file(root, name)?;
        fs.write(fd, &[b'-'; MAX_FILE_SIZE])?;
        fs.close_file(fd)?;
    }
    Ok(())
}

/// One workload request under the gate discipline: reads share a
/// turn, writes take the exclusive one.
fn apply(fs: &Mutex<EmuFileSystem<MemDisk>>, gate: &RwGate, root: DirFd, op: &Op) {
    match *op {
        Op::Read { file } => {
            let _turn = gate.read();
            let mut fs = fs.lock().unwrap();
            let fd = fs.open_file(root, file).expect("open for read");
            let data = fs.read(fd, MAX_FILE_SIZE).expect("read");
            fs.close_file(fd).expect("close");
            log::trace!("read {} bytes from {file}", data.len());
        }
        Op::Write { file, byte } => {
            let _turn = gate.write();
            let mut fs = fs.lock().unwrap();
            let fd = fs.open_file(root, file).expect("open for write");
            fs.write(fd, &[byte]).expect("write");
            fs.close_file(fd).expect("close");
            log::trace!("wrote {byte:#04x} to {file}");
        }
    }
}
