use geo::Point;

use super::{
    assemble_rings, is_closed, polygon_centroid, to_points, way_geometry, Bounds, Centroid,
    CentroidKind, Geometry,
};
use crate::codec::NodeCoord;
use crate::entity::MemberKind;

pub const ROLE_OUTER: &str = "outer";
pub const ROLE_ADMIN_CENTRE: &str = "admin_centre";

/// A relation member with its nodes resolved from the coordinate cache
#[derive(Debug, Clone)]
pub struct MemberGeometry {
    pub kind: MemberKind,
    pub role: String,
    /// One coordinate for a node member, the way's nodes in order for a way member
    pub coords: Vec<NodeCoord>,
}

/// Centroid and bounds of a relation from its resolved members, in member order.
///
/// The member way with the largest bounding box supplies both, unless a ring stitched
/// together from open `outer` ways is larger still. An `admin_centre` node replaces the
/// centroid whichever way the bounds were chosen. Nested relations are not followed.
pub fn relation_geometry(members: &[MemberGeometry]) -> Option<Geometry> {
    let mut admin_centre: Option<Centroid> = None;
    let mut centroid: Option<Centroid> = None;
    let mut bounds: Option<Bounds> = None;
    let mut largest_area = 0.0;
    let mut open_outers = Vec::new();

    for member in members {
        let Some(first) = member.coords.first() else {
            continue;
        };

        match member.kind {
            MemberKind::Node if member.role == ROLE_ADMIN_CENTRE => {
                admin_centre = Some(Centroid {
                    lat: first.lat,
                    lon: first.lon,
                    kind: CentroidKind::AdminCentre,
                });
            }
            MemberKind::Way => {
                let points = to_points(&member.coords);
                if member.role == ROLE_OUTER && !is_closed(&points) {
                    open_outers.push(points);
                    continue;
                }

                let Some(geometry) = way_geometry(&member.coords) else {
                    log::warn!("failed to calculate bounds for relation member way");
                    continue;
                };
                let area = geometry.bounds.area();
                if area > largest_area {
                    largest_area = area;
                    centroid = Some(geometry.centroid);
                    bounds = Some(geometry.bounds);
                }
            }
            MemberKind::Node | MemberKind::Relation => {}
        }
    }

    let mut outer: Option<(Vec<Point<f64>>, Bounds)> = None;
    for ring in assemble_rings(open_outers) {
        let Some(ring_bounds) = Bounds::from_points(&ring) else {
            continue;
        };
        if ring_bounds.area() > outer.as_ref().map_or(0.0, |(_, b)| b.area()) {
            outer = Some((ring, ring_bounds));
        }
    }

    if let Some((ring, ring_bounds)) = outer {
        if ring_bounds.area() > bounds.map_or(0.0, |b| b.area()) {
            bounds = Some(ring_bounds);
            if admin_centre.is_none() {
                centroid = Some(Centroid::computed(polygon_centroid(&ring)));
            }
        }
    }

    Some(Geometry {
        centroid: admin_centre.or(centroid)?,
        bounds: bounds?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way(role: &str, lon_lat: &[(f64, f64)]) -> MemberGeometry {
        MemberGeometry {
            kind: MemberKind::Way,
            role: role.to_string(),
            coords: lon_lat
                .iter()
                .map(|(lon, lat)| NodeCoord::new(*lat, *lon))
                .collect(),
        }
    }

    fn node(role: &str, lat: f64, lon: f64) -> MemberGeometry {
        MemberGeometry {
            kind: MemberKind::Node,
            role: role.to_string(),
            coords: vec![NodeCoord::new(lat, lon)],
        }
    }

    #[test]
    fn test_largest_member_wins() {
        let members = vec![
            way("", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            way("", &[(10.0, 10.0), (14.0, 10.0), (14.0, 14.0), (10.0, 10.0)]),
            way("", &[(20.0, 20.0), (21.0, 21.0)]),
        ];
        let geometry = relation_geometry(&members).unwrap();
        assert_eq!(
            geometry.bounds,
            Bounds {
                north: 14.0,
                south: 10.0,
                east: 14.0,
                west: 10.0
            }
        );
        assert_eq!(geometry.centroid.kind, CentroidKind::Computed);
        assert!(geometry.centroid.lon > 10.0 && geometry.centroid.lon < 14.0);
    }

    #[test]
    fn test_admin_centre_overrides_centroid_only() {
        let members = vec![
            node(ROLE_ADMIN_CENTRE, 5.0, 6.0),
            way("outer", &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]),
        ];
        let geometry = relation_geometry(&members).unwrap();
        assert_eq!(geometry.centroid.lat, 5.0);
        assert_eq!(geometry.centroid.lon, 6.0);
        assert_eq!(geometry.centroid.kind, CentroidKind::AdminCentre);
        assert_eq!(geometry.bounds.north, 10.0);
        assert_eq!(geometry.bounds.east, 10.0);
    }

    #[test]
    fn test_other_node_members_ignored() {
        let members = vec![
            node("label", 50.0, 50.0),
            way("", &[(0.0, 0.0), (1.0, 1.0)]),
        ];
        let geometry = relation_geometry(&members).unwrap();
        assert_eq!(geometry.centroid.kind, CentroidKind::Computed);
        assert_eq!(geometry.bounds.north, 1.0);
    }

    #[test]
    fn test_open_outers_are_stitched() {
        let members = vec![
            way("outer", &[(0.0, 0.0), (2.0, 0.0)]),
            way("outer", &[(2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]),
            way("outer", &[(2.0, 0.0), (2.0, 2.0)]),
            way("inner", &[(0.5, 0.5), (1.0, 0.5), (1.0, 1.0), (0.5, 0.5)]),
        ];
        let geometry = relation_geometry(&members).unwrap();
        assert_eq!(
            geometry.bounds,
            Bounds {
                north: 2.0,
                south: 0.0,
                east: 2.0,
                west: 0.0
            }
        );
        // ring runs (2,0) (2,2) (0,2) (0,0) (2,0), junctions collapsed
        assert!((geometry.centroid.lon - 1.2000682).abs() < 1e-6);
        assert!((geometry.centroid.lat - 0.8000975).abs() < 1e-6);
    }

    #[test]
    fn test_smaller_ring_does_not_replace_member() {
        let members = vec![
            way("", &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]),
            way("outer", &[(0.0, 0.0), (1.0, 0.0)]),
            way("outer", &[(1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
        ];
        let geometry = relation_geometry(&members).unwrap();
        assert_eq!(geometry.bounds.north, 10.0);
    }

    #[test]
    fn test_admin_centre_survives_stitched_ring() {
        let members = vec![
            way("outer", &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]),
            way("outer", &[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0)]),
            node(ROLE_ADMIN_CENTRE, 1.5, 1.5),
        ];
        let geometry = relation_geometry(&members).unwrap();
        assert_eq!(geometry.centroid.kind, CentroidKind::AdminCentre);
        assert_eq!((geometry.centroid.lat, geometry.centroid.lon), (1.5, 1.5));
        assert_eq!(geometry.bounds.north, 2.0);
    }

    #[test]
    fn test_unresolvable_relations() {
        assert!(relation_geometry(&[]).is_none());

        // admin centre alone has no bounds
        assert!(relation_geometry(&[node(ROLE_ADMIN_CENTRE, 1.0, 1.0)]).is_none());

        // outer fragments that never close
        let members = vec![
            way("outer", &[(0.0, 0.0), (1.0, 0.0)]),
            way("outer", &[(5.0, 5.0), (6.0, 5.0)]),
        ];
        assert!(relation_geometry(&members).is_none());

        let empty = MemberGeometry {
            kind: MemberKind::Way,
            role: String::new(),
            coords: Vec::new(),
        };
        assert!(relation_geometry(&[empty]).is_none());
    }
}
