use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use intcode_vm::{Buffer, EmptyChannel, Program, Status};

const QUINE: &str =
    "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99";

/// Counts down from the input value to zero, emitting nothing
const COUNTDOWN: &str = "3,10,1001,10,-1,10,1005,10,2,99,0";

pub fn criterion_benchmark(c: &mut Criterion) {
    let quine = Program::parse(QUINE).unwrap();
    c.bench_function("quine", |b| {
        b.iter(|| {
            let mut vm = quine.clone();
            let mut io = Buffer::new();
            assert_eq!(vm.run(&mut io), Ok(Status::Halted));
            black_box(io.take_output())
        })
    });

    let countdown = Program::parse(COUNTDOWN).unwrap();
    c.bench_function("countdown", |b| {
        b.iter(|| {
            let mut vm = countdown.clone();
            let mut io = Buffer::from(vec![black_box(10_000)]);
            assert_eq!(vm.run(&mut io), Ok(Status::Halted));
            assert_eq!(vm.run(&mut EmptyChannel), Ok(Status::Halted));
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
