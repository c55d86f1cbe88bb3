#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vm::{Buffer, Program, State, Status};

#[derive(Arbitrary, Debug)]
struct Input {
    code: Vec<i64>,
    input: Vec<i64>,
}

fuzz_target!(|data: Input| {
    let mut a = Program::from(data.code.clone());
    let mut b = Program::from(data.code);

    // Feed one program everything up front, and the other one value at a
    // time; both must end up in the same place.  Give up on anything that
    // takes more than 65K cycles.
    let mut io_a = Buffer::from(data.input.clone());
    let Ok(Some(status_a)) =
        a.run_until(&mut io_a, |_vm, i| i > 65536).map_err(|_| ())
    else {
        return;
    };

    let mut io_b = Buffer::new();
    let mut input = data.input.into_iter();
    let status_b = loop {
        match b.run_until(&mut io_b, |_vm, i| i > 65536) {
            Ok(Some(Status::AwaitingInput)) => match input.next() {
                Some(v) => io_b.push_input(v),
                None => break Status::AwaitingInput,
            },
            Ok(Some(s)) => break s,
            Ok(None) | Err(_) => return,
        }
    };

    assert_eq!(status_a, status_b, "status mismatch");
    if status_a == Status::Halted {
        assert_eq!(a.memory(), b.memory(), "memory mismatch");
        assert_eq!(io_a.output(), io_b.output(), "output mismatch");
        assert_eq!(a.state(), &State::Halted);
    }
});
