//! Text conventions for programs which talk in ASCII
use log::debug;
use vm::Value;

/// An output value which isn't an ASCII character
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("value {value} at position {index} is not ASCII")]
pub struct NotAscii {
    /// Position of the value in the output
    pub index: usize,
    /// The offending value
    pub value: Value,
}

/// Converts text into input values, one per byte
pub fn encode(s: &str) -> Vec<Value> {
    s.bytes().map(Value::from).collect()
}

/// Renders output values as text
///
/// Programs often finish an ASCII rendering with a single large value (a
/// score or a count); use [`split_trailer`] to peel it off first.
pub fn decode(values: &[Value]) -> Result<String, NotAscii> {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| match u8::try_from(value) {
            Ok(b) if b.is_ascii() => Ok(char::from(b)),
            _ => Err(NotAscii { index, value }),
        })
        .collect()
}

/// Splits a trailing non-ASCII value from the rest of the output
pub fn split_trailer(values: &[Value]) -> (&[Value], Option<Value>) {
    match values.split_last() {
        Some((&last, rest)) if !(0..=127).contains(&last) => {
            (rest, Some(last))
        }
        _ => (values, None),
    }
}

/// Renders output for display
///
/// ASCII output is printed as text, and a trailing non-ASCII value goes on
/// its own line.  If anything else isn't ASCII, every value is printed in
/// decimal on its own line instead.
pub fn render(values: &[Value]) -> String {
    let (body, trailer) = split_trailer(values);
    let mut out = match decode(body) {
        Ok(s) => s,
        Err(e) => {
            debug!("printing raw output: {e}");
            body.iter().map(|v| format!("{v}\n")).collect()
        }
    };
    if let Some(t) = trailer {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out += &format!("{t}\n");
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let v = encode("A,B\n");
        assert_eq!(v, [65, 44, 66, 10]);
        assert_eq!(decode(&v).unwrap(), "A,B\n");
    }

    #[test]
    fn bad_values() {
        assert_eq!(
            decode(&[35, 46, 200]),
            Err(NotAscii {
                index: 2,
                value: 200
            })
        );
        assert_eq!(
            decode(&[-1]),
            Err(NotAscii {
                index: 0,
                value: -1
            })
        );
    }

    #[test]
    fn trailer() {
        let out = [35, 10, 1234567];
        let (text, extra) = split_trailer(&out);
        assert_eq!(decode(text).unwrap(), "#\n");
        assert_eq!(extra, Some(1234567));

        assert_eq!(split_trailer(&[35, 10]), (&[35, 10][..], None));
        assert_eq!(split_trailer(&[]), (&[][..], None));
    }

    #[test]
    fn rendering() {
        assert_eq!(render(&encode("Hi\n")), "Hi\n");
        assert_eq!(render(&[35, 10, 1234]), "#\n1234\n");
        assert_eq!(render(&[35, 1234]), "#\n1234\n");
        assert_eq!(render(&[500, 65]), "500\n65\n");
        assert_eq!(render(&[-3]), "-3\n");
        assert_eq!(render(&[]), "");
    }
}
