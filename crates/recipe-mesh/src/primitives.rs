//! Triangle tessellation of the recipe primitives.
//!
//! Conventions: Z is up. Boxes span `length` on X, `width` on Y and `height`
//! on Z. Cylinders and cones run along Y, so a wheel's axle is lateral.
//! Planes lie in XY facing +Z, tori lie in XY around Z. Every shape is
//! centered on its local origin and wound counter-clockwise when seen from
//! outside.

use std::f64::consts::{PI, TAU};

use recipe_core::Primitive;

use crate::Mesh;

pub const CYLINDER_RADIAL_SEGMENTS: u32 = 32;
pub const SPHERE_WIDTH_SEGMENTS: u32 = 32;
pub const SPHERE_HEIGHT_SEGMENTS: u32 = 32;
pub const TORUS_RADIAL_SEGMENTS: u32 = 16;
pub const TORUS_TUBULAR_SEGMENTS: u32 = 100;

pub fn tessellate(primitive: &Primitive) -> Mesh {
    match *primitive {
        Primitive::Box {
            length,
            width,
            height,
        } => box_mesh(length, width, height),
        Primitive::Cylinder { radius, height } => {
            frustum_mesh(radius, radius, height, CYLINDER_RADIAL_SEGMENTS)
        }
        Primitive::Sphere { radius } => {
            sphere_mesh(radius, SPHERE_WIDTH_SEGMENTS, SPHERE_HEIGHT_SEGMENTS)
        }
        Primitive::Cone { radius, height } => {
            frustum_mesh(0.0, radius, height, CYLINDER_RADIAL_SEGMENTS)
        }
        Primitive::Torus { radius, tube } => torus_mesh(
            radius,
            tube,
            TORUS_RADIAL_SEGMENTS,
            TORUS_TUBULAR_SEGMENTS,
        ),
        Primitive::Plane { width, height } => plane_mesh(width, height),
    }
}

/// Six quads, four unshared vertices each, two triangles per quad.
pub fn box_mesh(length: f64, width: f64, height: f64) -> Mesh {
    let half = [length * 0.5, width * 0.5, height * 0.5];
    let mut mesh = Mesh::empty();

    for axis in 0..3 {
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;
        for sign in [1.0, -1.0] {
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)].map(|(su, sv)| {
                let mut point = [0.0; 3];
                point[axis] = sign * half[axis];
                point[u] = su * half[u];
                point[v] = sv * half[v];
                mesh.push_vertex(point)
            });
            let [a, b, c, d] = corners;
            if sign > 0.0 {
                mesh.push_triangle(a, b, c);
                mesh.push_triangle(a, c, d);
            } else {
                mesh.push_triangle(a, c, b);
                mesh.push_triangle(a, d, c);
            }
        }
    }

    mesh
}

/// Capped frustum along Y. A zero top radius gives a cone without a top cap.
pub fn frustum_mesh(radius_top: f64, radius_bottom: f64, height: f64, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let half_height = height * 0.5;
    let mut mesh = Mesh::empty();

    // Side wall: a top ring then a bottom ring, each closed with a seam vertex.
    let mut rings = [Vec::new(), Vec::new()];
    for (row, ring) in rings.iter_mut().enumerate() {
        let (radius, y) = if row == 0 {
            (radius_top, half_height)
        } else {
            (radius_bottom, -half_height)
        };
        for x in 0..=segments {
            let theta = x as f64 / segments as f64 * TAU;
            ring.push(mesh.push_vertex([radius * theta.sin(), y, radius * theta.cos()]));
        }
    }
    for x in 0..segments as usize {
        let a = rings[0][x];
        let b = rings[1][x];
        let c = rings[1][x + 1];
        let d = rings[0][x + 1];
        if radius_top > 0.0 {
            mesh.push_triangle(a, b, d);
        }
        if radius_bottom > 0.0 {
            mesh.push_triangle(b, c, d);
        }
    }

    if radius_top > 0.0 {
        push_cap(&mut mesh, radius_top, half_height, segments, true);
    }
    if radius_bottom > 0.0 {
        push_cap(&mut mesh, radius_bottom, -half_height, segments, false);
    }

    mesh
}

fn push_cap(mesh: &mut Mesh, radius: f64, y: f64, segments: u32, top: bool) {
    let centers = (0..segments)
        .map(|_| mesh.push_vertex([0.0, y, 0.0]))
        .collect::<Vec<_>>();
    let ring = (0..=segments)
        .map(|x| {
            let theta = x as f64 / segments as f64 * TAU;
            mesh.push_vertex([radius * theta.sin(), y, radius * theta.cos()])
        })
        .collect::<Vec<_>>();

    for (x, center) in centers.into_iter().enumerate() {
        if top {
            mesh.push_triangle(ring[x], ring[x + 1], center);
        } else {
            mesh.push_triangle(ring[x + 1], ring[x], center);
        }
    }
}

/// UV sphere with poles on Y. The pole rows emit one triangle per quad.
pub fn sphere_mesh(radius: f64, width_segments: u32, height_segments: u32) -> Mesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = Mesh::empty();
    let mut grid = Vec::with_capacity(height_segments as usize + 1);

    for iy in 0..=height_segments {
        let v = iy as f64 / height_segments as f64;
        let row = (0..=width_segments)
            .map(|ix| {
                let u = ix as f64 / width_segments as f64;
                mesh.push_vertex([
                    -radius * (u * TAU).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * TAU).sin() * (v * PI).sin(),
                ])
            })
            .collect::<Vec<_>>();
        grid.push(row);
    }

    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                mesh.push_triangle(a, b, d);
            }
            if iy != height_segments as usize - 1 {
                mesh.push_triangle(b, c, d);
            }
        }
    }

    mesh
}

/// Ring torus in the XY plane around Z.
pub fn torus_mesh(radius: f64, tube: f64, radial_segments: u32, tubular_segments: u32) -> Mesh {
    let radial_segments = radial_segments.max(3);
    let tubular_segments = tubular_segments.max(3);
    let mut mesh = Mesh::empty();

    for j in 0..=radial_segments {
        let v = j as f64 / radial_segments as f64 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f64 / tubular_segments as f64 * TAU;
            let ring = radius + tube * v.cos();
            mesh.push_vertex([ring * u.cos(), ring * u.sin(), tube * v.sin()]);
        }
    }

    let stride = tubular_segments + 1;
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(b, c, d);
        }
    }

    mesh
}

/// Single quad facing +Z, `width` along X and `height` along Y.
pub fn plane_mesh(width: f64, height: f64) -> Mesh {
    let half_width = width * 0.5;
    let half_height = height * 0.5;
    let mut mesh = Mesh::empty();

    for iy in 0..2 {
        let y = iy as f64 * height - half_height;
        for ix in 0..2 {
            let x = ix as f64 * width - half_width;
            mesh.push_vertex([x, -y, 0.0]);
        }
    }
    mesh.push_triangle(0, 2, 1);
    mesh.push_triangle(2, 3, 1);

    mesh
}

#[cfg(test)]
mod tests {
    use recipe_core::Primitive;

    use super::{box_mesh, frustum_mesh, plane_mesh, sphere_mesh, tessellate, torus_mesh};
    use crate::Mesh;

    fn extent(mesh: &Mesh) -> [f64; 3] {
        mesh.bounding_box().expect("mesh has vertices").extent()
    }

    fn assert_extent(mesh: &Mesh, expected: [f64; 3]) {
        let actual = extent(mesh);
        for axis in 0..3 {
            assert!(
                (actual[axis] - expected[axis]).abs() < 1e-9,
                "axis {axis}: actual={actual:?} expected={expected:?}"
            );
        }
    }

    fn assert_indices_in_range(mesh: &Mesh) {
        let count = mesh.vertices.len() as u32;
        assert!(
            mesh.triangles
                .iter()
                .all(|triangle| triangle.iter().all(|index| *index < count))
        );
    }

    fn signed_volume(mesh: &Mesh) -> f64 {
        mesh.triangles
            .iter()
            .map(|tri| {
                let a = mesh.vertices[tri[0] as usize];
                let b = mesh.vertices[tri[1] as usize];
                let c = mesh.vertices[tri[2] as usize];
                let cross = [
                    b[1] * c[2] - b[2] * c[1],
                    b[2] * c[0] - b[0] * c[2],
                    b[0] * c[1] - b[1] * c[0],
                ];
                (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]) / 6.0
            })
            .sum()
    }

    #[test]
    fn box_has_six_quads_and_matching_extents() {
        let mesh = box_mesh(200.0, 150.0, 10.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangles.len(), 12);
        assert_extent(&mesh, [200.0, 150.0, 10.0]);
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn box_winding_faces_outward() {
        let volume = signed_volume(&box_mesh(2.0, 3.0, 4.0));
        assert!((volume - 24.0).abs() < 1e-9, "volume={volume}");
    }

    #[test]
    fn cylinder_counts_and_extents() {
        let mesh = frustum_mesh(50.0, 50.0, 100.0, 32);
        assert_eq!(mesh.vertices.len(), 66 + 2 * 65);
        assert_eq!(mesh.triangles.len(), 64 + 2 * 32);
        assert_extent(&mesh, [100.0, 100.0, 100.0]);
        assert_indices_in_range(&mesh);
        assert!(signed_volume(&mesh) > 0.0);
    }

    #[test]
    fn cone_has_no_top_cap() {
        let mesh = frustum_mesh(0.0, 20.0, 60.0, 32);
        assert_eq!(mesh.vertices.len(), 66 + 65);
        assert_eq!(mesh.triangles.len(), 32 + 32);
        assert_extent(&mesh, [40.0, 60.0, 40.0]);
        assert!(signed_volume(&mesh) > 0.0);
    }

    #[test]
    fn sphere_skips_degenerate_pole_triangles() {
        let mesh = sphere_mesh(50.0, 32, 32);
        assert_eq!(mesh.vertices.len(), 33 * 33);
        assert_eq!(mesh.triangles.len(), 32 * 32 * 2 - 64);
        assert_indices_in_range(&mesh);
        let bbox = mesh.bounding_box().expect("sphere has vertices");
        assert!((bbox.max[1] - 50.0).abs() < 1e-9);
        assert!((bbox.min[1] + 50.0).abs() < 1e-9);
    }

    #[test]
    fn torus_grid_counts() {
        let mesh = torus_mesh(50.0, 10.0, 16, 100);
        assert_eq!(mesh.vertices.len(), 17 * 101);
        assert_eq!(mesh.triangles.len(), 16 * 100 * 2);
        assert_indices_in_range(&mesh);
        assert_extent(&mesh, [120.0, 120.0, 20.0]);
    }

    #[test]
    fn plane_is_a_single_quad() {
        let mesh = plane_mesh(80.0, 40.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangles.len(), 2);
        let bbox = mesh.bounding_box().expect("plane has vertices");
        assert_eq!(bbox.extent(), [80.0, 40.0, 0.0]);
    }

    #[test]
    fn tessellate_dispatches_on_primitive() {
        let sphere = tessellate(&Primitive::Sphere { radius: 5.0 });
        assert_eq!(sphere.vertices.len(), 33 * 33);

        let cone = tessellate(&Primitive::Cone {
            radius: 5.0,
            height: 10.0,
        });
        assert_eq!(cone.triangles.len(), 64);
    }
}
