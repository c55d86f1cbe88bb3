use intcode_host::amplifier::{max_signal, Wiring};
use vm::Program;

fn check(listing: &str, wiring: Wiring, signal: i64, order: &[i64]) {
    let program = Program::parse(listing).expect("invalid listing");
    let phases: Vec<i64> = match wiring {
        Wiring::Serial => (0..=4).collect(),
        Wiring::Feedback => (5..=9).collect(),
    };
    let (best, best_order) =
        max_signal(&program, &phases, wiring, 0).expect("chain failed");
    assert_eq!(best, signal, "wrong signal for {listing}");
    assert_eq!(best_order, order, "wrong phase order for {listing}");
}

#[test]
fn serial_43210() {
    check(
        "3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0",
        Wiring::Serial,
        43210,
        &[4, 3, 2, 1, 0],
    );
}

#[test]
fn serial_54321() {
    check(
        "3,23,3,24,1002,24,10,24,1002,23,-1,23,101,5,23,23,1,24,23,23,\
         4,23,99,0,0",
        Wiring::Serial,
        54321,
        &[0, 1, 2, 3, 4],
    );
}

#[test]
fn serial_65210() {
    check(
        "3,31,3,32,1002,32,10,32,1001,31,-2,31,1007,31,0,33,\
         1002,33,7,33,1,33,31,31,1,32,31,31,4,31,99,0,0,0",
        Wiring::Serial,
        65210,
        &[1, 0, 4, 3, 2],
    );
}

#[test]
fn feedback_139629729() {
    check(
        "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
         27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
        Wiring::Feedback,
        139629729,
        &[9, 8, 7, 6, 5],
    );
}

#[test]
fn feedback_18216() {
    check(
        "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,\
         -5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,\
         53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10",
        Wiring::Feedback,
        18216,
        &[9, 7, 8, 5, 6],
    );
}
