//! Byte shuffle filter: regroups the bytes of consecutive fixed-width atoms
//! so all the low bytes come first, then all the second bytes, etc. Makes
//! numeric data with slowly varying high bytes compress better downstream.
//! Applied before compression, undone after decompression.

/// `typesize` is the atom width. `buf.len()` need not be a multiple of
/// `typesize` — the remainder (a "leftover" partial atom) is left untouched
/// at the tail, matching the reference library's behavior.
pub fn shuffle(typesize: usize, buf: &[u8]) -> Vec<u8> {
    if typesize <= 1 {
        return buf.to_vec();
    }
    let nitems = buf.len() / typesize;
    let leftover = buf.len() - nitems * typesize;
    let mut out = Vec::with_capacity(buf.len());
    for lane in 0..typesize {
        for item in 0..nitems {
            out.push(buf[item * typesize + lane]);
        }
    }
    out.extend_from_slice(&buf[nitems * typesize..nitems * typesize + leftover]);
    out
}

pub fn unshuffle(typesize: usize, buf: &[u8]) -> Vec<u8> {
    if typesize <= 1 {
        return buf.to_vec();
    }
    let nitems = buf.len() / typesize;
    let leftover = buf.len() - nitems * typesize;
    let mut out = vec![0u8; nitems * typesize];
    for lane in 0..typesize {
        for item in 0..nitems {
            out[item * typesize + lane] = buf[lane * nitems + item];
        }
    }
    out.extend_from_slice(&buf[nitems * typesize..nitems * typesize + leftover]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let data: Vec<u8> = (0..37u8).collect();
        for typesize in [1, 2, 4, 8] {
            let s = shuffle(typesize, &data);
            let back = unshuffle(typesize, &s);
            assert_eq!(back, data, "typesize {typesize}");
        }
    }
}
