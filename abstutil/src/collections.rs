/// Index into a vector, treating it as circular. Negative indices wrap around from the end.
pub fn wraparound_get<T>(vec: &[T], idx: isize) -> &T {
    let len = vec.len() as isize;
    let idx = idx % len;
    let idx = if idx >= 0 { idx } else { idx + len };
    &vec[idx as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraparound_get() {
        let v = vec![10, 20, 30];
        assert_eq!(*wraparound_get(&v, -1), 30);
        assert_eq!(*wraparound_get(&v, 3), 10);
        assert_eq!(*wraparound_get(&v, 1), 20);
    }
}
