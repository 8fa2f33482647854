use std::cmp::Ordering;

/// Compare two strings in natural order: embedded digit runs compare by numeric value, so
/// `"2.jpg" < "10.jpg"`. Other characters compare case-insensitively, with a final byte-wise
/// tie-break so the order is total and stable.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ia = Chunks::new(a);
    let mut ib = Chunks::new(b);
    loop {
        match (ia.next(), ib.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                let ord = match (ca, cb) {
                    (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digit_runs(x, y),
                    (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
                    (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
                    (Chunk::Text(x), Chunk::Text(y)) => cmp_text_runs(x, y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn cmp_digit_runs(x: &str, y: &str) -> Ordering {
    let xt = x.trim_start_matches('0');
    let yt = y.trim_start_matches('0');
    xt.len()
        .cmp(&yt.len())
        .then_with(|| xt.cmp(yt))
        // "01" after "1" keeps distinct names distinct
        .then_with(|| x.len().cmp(&y.len()))
}

fn cmp_text_runs(x: &str, y: &str) -> Ordering {
    let lower = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    lower(x).cmp(&lower(y))
}

#[derive(Clone, Copy, Debug)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digits {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/natural.rs"]
mod tests;
