/// A value written either as a single item or as a list of items.
///
/// Remembers which form it came from so it can be written back the same way.
///
/// ```
/// use token_graph_util::OneOrMany;
///
/// let one = OneOrMany::One(3);
/// let many = OneOrMany::Many(vec![1, 2]);
/// assert_eq!(one.iter().copied().collect::<Vec<_>>(), vec![3]);
/// assert_eq!(many.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Many(items) => items.iter(),
        }
    }

    /// Apply `f` to every item, keeping the one/many shape.
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<OneOrMany<U>, E> {
        Ok(match self {
            OneOrMany::One(item) => OneOrMany::One(f(item)?),
            OneOrMany::Many(items) => {
                OneOrMany::Many(items.iter().map(f).collect::<Result<Vec<_>, _>>()?)
            }
        })
    }
}

impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_map_keeps_shape() {
        let one: OneOrMany<i32> = OneOrMany::One(2);
        let doubled: Result<_, ()> = one.try_map(|x| Ok(x * 2));
        assert_eq!(doubled, Ok(OneOrMany::One(4)));

        let many = OneOrMany::Many(vec![1, 2, 3]);
        let failed = many.try_map(|x| if *x < 3 { Ok(*x) } else { Err(*x) });
        assert_eq!(failed, Err(3));
    }

    #[test]
    fn empty_many_is_empty() {
        let many: OneOrMany<u8> = OneOrMany::Many(vec![]);
        assert!(many.is_empty());
        assert_eq!(many.iter().count(), 0);
    }
}
