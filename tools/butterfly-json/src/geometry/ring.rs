use geo::Point;

type Fragment = Vec<Point<f64>>;

/// Join open way fragments end to end into closed rings.
///
/// Fragments are first joined only where one ends at the start of another. Once no such pair
/// is left, a pair sharing an end or a start is joined too by reversing one side. Junction
/// points are kept twice. Only fragments that close on themselves are returned, in the order
/// they were completed.
pub fn assemble_rings(mut fragments: Vec<Fragment>) -> Vec<Fragment> {
    let mut last_count = fragments.len();
    let mut relaxed = false;

    while fragments.len() > 1 {
        fragments = connect_once(fragments, relaxed);

        if fragments.len() == last_count {
            if relaxed {
                break;
            }
            relaxed = true;
        }
        last_count = fragments.len();
    }

    fragments.retain(|f| f.first() == f.last());
    fragments
}

/// Merge the first joinable pair, in scan order, and append the result
fn connect_once(fragments: Vec<Fragment>, relaxed: bool) -> Vec<Fragment> {
    let Some((i, j, merged)) = first_join(&fragments, relaxed) else {
        return fragments;
    };

    let mut rest: Vec<Fragment> = fragments
        .into_iter()
        .enumerate()
        .filter(|(k, _)| *k != i && *k != j)
        .map(|(_, f)| f)
        .collect();
    rest.push(merged);
    rest
}

fn first_join(fragments: &[Fragment], relaxed: bool) -> Option<(usize, usize, Fragment)> {
    for (i, a) in fragments.iter().enumerate() {
        for (j, b) in fragments.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some(merged) = join(a, b, relaxed) {
                return Some((i, j, merged));
            }
        }
    }
    None
}

fn join(a: &[Point<f64>], b: &[Point<f64>], relaxed: bool) -> Option<Fragment> {
    let (a_first, a_last) = (a.first()?, a.last()?);
    let (b_first, b_last) = (b.first()?, b.last()?);

    if a_last == b_first {
        Some(concat(a.iter(), b.iter()))
    } else if a_first == b_last {
        Some(concat(b.iter(), a.iter()))
    } else if relaxed && a_last == b_last {
        Some(concat(a.iter(), b.iter().rev()))
    } else if relaxed && a_first == b_first {
        Some(concat(a.iter().rev(), b.iter()))
    } else {
        None
    }
}

fn concat<'a>(
    head: impl Iterator<Item = &'a Point<f64>>,
    tail: impl Iterator<Item = &'a Point<f64>>,
) -> Fragment {
    head.chain(tail).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // corners of a harbour basin, plus a small island inside it
    const A: (f64, f64) = (9.869660139083862, 53.545229135979696);
    const B: (f64, f64) = (9.869220256805418, 53.54410713060241);
    const C: (f64, f64) = (9.80645354837179, 53.55131298705578);
    const D: (f64, f64) = (9.806404933333397, 53.55129247064265);
    const E: (f64, f64) = (9.80623260140419, 53.55131577569369);
    const F: (f64, f64) = (9.806125648319721, 53.55134983689904);
    const G: (f64, f64) = (9.806103184819221, 53.55139963393354);

    const P: (f64, f64) = (9.806362353265285, 53.55137991431488);
    const Q: (f64, f64) = (9.80620376765728, 53.55143369507137);
    const R: (f64, f64) = (9.806171916425228, 53.55138529239359);
    const S: (f64, f64) = (9.806314073503017, 53.551339479108485);

    fn line(coords: &[(f64, f64)]) -> Fragment {
        coords.iter().map(|(lon, lat)| Point::new(*lon, *lat)).collect()
    }

    fn stray() -> Fragment {
        line(&[
            (9.123456111111111, 53.891011111111111),
            (9.234567111111111, 53.910111111111111),
            (9.345678111111111, 53.101112111111111),
        ])
    }

    #[test]
    fn test_fragments_in_one_direction() {
        let rings = assemble_rings(vec![
            line(&[A, B]),
            stray(),
            line(&[B, C, D]),
            line(&[D, E, F, G]),
            line(&[G, A]),
        ]);

        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0], line(&[A, B, B, C, D, D, E, F, G, G, A]));
    }

    #[test]
    fn test_fragment_against_the_flow() {
        let rings = assemble_rings(vec![
            line(&[A, B]),
            stray(),
            line(&[B, C, D]),
            line(&[D, E, F, G]),
            line(&[A, G]),
        ]);

        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0], line(&[A, G, G, F, E, D, D, C, B, B, A]));
    }

    #[test]
    fn test_two_rings() {
        let rings = assemble_rings(vec![
            line(&[A, B]),
            stray(),
            line(&[B, C, D]),
            line(&[D, E, F, G]),
            line(&[G, A]),
            line(&[P, Q]),
            line(&[Q, R]),
            line(&[R, S]),
            line(&[S, P]),
        ]);

        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0], line(&[A, B, B, C, D, D, E, F, G, G, A]));
        assert_eq!(rings[1], line(&[P, Q, Q, R, R, S, S, P]));
    }

    #[test]
    fn test_unclosable_fragments() {
        assert!(assemble_rings(vec![line(&[A, B]), line(&[C, D])]).is_empty());
        assert!(assemble_rings(vec![stray()]).is_empty());
        assert!(assemble_rings(Vec::new()).is_empty());
    }

    #[test]
    fn test_single_closed_fragment() {
        let rings = assemble_rings(vec![line(&[A, B, C, A])]);
        assert_eq!(rings, vec![line(&[A, B, C, A])]);
    }
}
