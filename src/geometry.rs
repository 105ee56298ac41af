//! Procedural geometry for the scene's static meshes.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use itertools::iproduct;
use rand::Rng;

use crate::scene_graph::{Mesh, Topology, Vertex};

/// Outline of the lightning bolt logo in the XY plane (clockwise).
pub const BOLT_OUTLINE: [Vec2; 6] = [
    Vec2::new(-0.5, 1.0),
    Vec2::new(0.2, 0.2),
    Vec2::new(0.0, 0.2),
    Vec2::new(0.5, -1.0),
    Vec2::new(-0.2, -0.2),
    Vec2::new(0.0, -0.2),
];

fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_negative && has_positive)
}

/// Ear-clipping triangulation of a simple polygon. Returned triangles are
/// counter-clockwise regardless of the input winding.
pub fn triangulate_polygon(points: &[Vec2]) -> Vec<u32> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    if signed_area(points) < 0.0 {
        remaining.reverse();
    }

    let mut indices = Vec::with_capacity(points.len().saturating_sub(2) * 3);

    while remaining.len() > 3 {
        let n = remaining.len();
        let ear = (0..n).find(|&i| {
            let prev = points[remaining[(i + n - 1) % n]];
            let current = points[remaining[i]];
            let next = points[remaining[(i + 1) % n]];

            if (current - prev).perp_dot(next - current) <= 0.0 {
                return false;
            }

            remaining
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i && j != (i + n - 1) % n && j != (i + 1) % n)
                .all(|(_, &k)| !point_in_triangle(points[k], prev, current, next))
        });

        // Degenerate input. Fall back to a fan so we still emit something.
        let i = ear.unwrap_or(0);

        indices.extend([
            remaining[(i + n - 1) % n] as u32,
            remaining[i] as u32,
            remaining[(i + 1) % n] as u32,
        ]);
        remaining.remove(i);
    }

    if remaining.len() == 3 {
        indices.extend(remaining.iter().map(|&i| i as u32));
    }

    indices
}

/// Flat shape in the XY plane facing +Z.
pub fn shape_mesh(name: &str, outline: &[Vec2]) -> Mesh {
    let vertices = outline
        .iter()
        .map(|p| Vertex::new(p.extend(0.0), Vec3::Z))
        .collect();

    Mesh {
        name: name.to_owned(),
        topology: Topology::Triangles,
        vertices,
        indices: triangulate_polygon(outline),
    }
}

pub fn uv_sphere(name: &str, radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let vertices = iproduct!(0..=height_segments, 0..=width_segments)
        .map(|(iy, ix)| {
            let v = iy as f32 / height_segments as f32;
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            Vertex::new(normal * radius, normal)
        })
        .collect();

    let row = width_segments + 1;
    let mut indices = Vec::new();
    for (iy, ix) in iproduct!(0..height_segments, 0..width_segments) {
        let a = iy * row + ix + 1;
        let b = iy * row + ix;
        let c = (iy + 1) * row + ix;
        let d = (iy + 1) * row + ix + 1;

        if iy != 0 {
            indices.extend([a, b, d]);
        }
        if iy != height_segments - 1 {
            indices.extend([b, c, d]);
        }
    }

    Mesh {
        name: name.to_owned(),
        topology: Topology::Triangles,
        vertices,
        indices,
    }
}

/// Square grid of lines in the XZ plane, `divisions + 1` lines per axis.
pub fn grid_lines(name: &str, size: f32, divisions: u32) -> Mesh {
    let half = size * 0.5;
    let step = size / divisions.max(1) as f32;

    let mut vertices = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        vertices.extend([
            Vertex::new(Vec3::new(-half, 0.0, k), Vec3::Y),
            Vertex::new(Vec3::new(half, 0.0, k), Vec3::Y),
            Vertex::new(Vec3::new(k, 0.0, -half), Vec3::Y),
            Vertex::new(Vec3::new(k, 0.0, half), Vec3::Y),
        ]);
    }

    Mesh {
        name: name.to_owned(),
        topology: Topology::Lines,
        indices: (0..vertices.len() as u32).collect(),
        vertices,
    }
}

/// Points uniformly distributed in a cube of side `size` centered at the origin.
pub fn particle_cube(name: &str, count: usize, size: f32, rng: &mut impl Rng) -> Mesh {
    let mut coordinate = || (rng.gen::<f32>() - 0.5) * size;
    let vertices = (0..count)
        .map(|_| Vertex::point(Vec3::new(coordinate(), coordinate(), coordinate())))
        .collect();

    Mesh {
        name: name.to_owned(),
        topology: Topology::Points,
        vertices,
        indices: Vec::new(),
    }
}

/// Points scattered over a spherical shell between `radius` and
/// `radius + depth`. The shell radius shrinks a little with every star, so
/// earlier stars tend to sit further out.
pub fn star_shell(name: &str, count: usize, radius: f32, depth: f32, rng: &mut impl Rng) -> Mesh {
    let mut r = radius + depth;
    let increment = depth / count.max(1) as f32;

    let vertices = (0..count)
        .map(|_| {
            r -= increment * rng.gen::<f32>();
            let polar = (1.0 - rng.gen::<f32>() * 2.0).acos();
            let azimuth = rng.gen::<f32>() * TAU;
            let direction = Vec3::new(
                polar.sin() * azimuth.sin(),
                polar.cos(),
                polar.sin() * azimuth.cos(),
            );
            Vertex::point(direction * r)
        })
        .collect();

    Mesh {
        name: name.to_owned(),
        topology: Topology::Points,
        vertices,
        indices: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn triangle_area(mesh: &Mesh) -> f32 {
        mesh.indices
            .chunks(3)
            .map(|tri| {
                let a = mesh.vertices[tri[0] as usize].position.truncate();
                let b = mesh.vertices[tri[1] as usize].position.truncate();
                let c = mesh.vertices[tri[2] as usize].position.truncate();
                (b - a).perp_dot(c - a) * 0.5
            })
            .sum()
    }

    #[test]
    fn bolt_triangulation_covers_outline() {
        let mesh = shape_mesh("bolt", &BOLT_OUTLINE);
        assert_eq!(mesh.indices.len(), (BOLT_OUTLINE.len() - 2) * 3);
        let expected = signed_area(&BOLT_OUTLINE).abs();
        assert!((triangle_area(&mesh) - expected).abs() < 1e-5);
    }

    #[test]
    fn clockwise_input_yields_counter_clockwise_triangles() {
        let square_cw = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ];
        let mesh = shape_mesh("square", &square_cw);
        assert!((triangle_area(&mesh) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = uv_sphere("orb", 0.5, 32, 32);
        assert_eq!(mesh.vertices.len(), 33 * 33);
        assert_eq!(mesh.indices.len(), (32 * 32 * 2 - 2 * 32) * 3);
        for vertex in &mesh.vertices {
            assert!((vertex.position.length() - 0.5).abs() < 1e-5);
            assert!((vertex.normal.length() - 1.0).abs() < 1e-5);
        }
        assert!(mesh
            .indices
            .iter()
            .all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn grid_has_two_lines_per_division_step() {
        let mesh = grid_lines("grid", 20.0, 20);
        assert_eq!(mesh.topology, Topology::Lines);
        assert_eq!(mesh.element_count(), 21 * 4);
        for vertex in &mesh.vertices {
            assert!(vertex.position.x.abs() <= 10.0 + 1e-6);
            assert!(vertex.position.z.abs() <= 10.0 + 1e-6);
            assert_eq!(vertex.position.y, 0.0);
        }
    }

    #[test]
    fn particles_fill_the_cube() {
        let mut rng = StdRng::seed_from_u64(7);
        let mesh = particle_cube("particles", 1000, 20.0, &mut rng);
        assert_eq!(mesh.element_count(), 1000);
        for vertex in &mesh.vertices {
            assert!(vertex.position.abs().max_element() <= 10.0);
        }
    }

    #[test]
    fn stars_stay_inside_the_shell() {
        let mut rng = StdRng::seed_from_u64(11);
        let mesh = star_shell("stars", 5000, 100.0, 50.0, &mut rng);
        assert_eq!(mesh.vertices.len(), 5000);
        for vertex in &mesh.vertices {
            let r = vertex.position.length();
            assert!((100.0 - 1e-2..=150.0 + 1e-2).contains(&r));
        }
    }

    #[test]
    fn same_seed_same_particles() {
        let a = particle_cube("a", 10, 20.0, &mut StdRng::seed_from_u64(3));
        let b = particle_cube("b", 10, 20.0, &mut StdRng::seed_from_u64(3));
        assert_eq!(a.vertices, b.vertices);
    }
}
