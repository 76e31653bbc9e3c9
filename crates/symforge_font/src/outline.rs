//! Glyph outlines as drawing commands.

/// A simplified representation of drawing commands for a glyph. Coordinates
/// are normalized (divided by units per em) and y increases upward. Every
/// contour starts with `MoveTo` and ends back on its starting point.
#[derive(Debug, PartialEq, Clone)]
pub enum GlyphCommand {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo {
        ctrl_x: f32,
        ctrl_y: f32,
        to_x: f32,
        to_y: f32,
    },
}

/// A glyph outline is just a sequence of path commands.
pub type GlyphOutline = Vec<GlyphCommand>;

/// One TrueType contour point in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinePoint {
    pub x: f32,
    pub y: f32,
    pub on_curve: bool,
}

fn midpoint(a: OutlinePoint, b: OutlinePoint) -> OutlinePoint {
    OutlinePoint {
        x: (a.x + b.x) * 0.5,
        y: (a.y + b.y) * 0.5,
        on_curve: true,
    }
}

/// Convert TrueType quadratic contours into commands in EM units.
///
/// Consecutive off-curve points imply an on-curve point halfway between them.
pub fn contours_to_commands(contours: &[Vec<OutlinePoint>], units_per_em: u16) -> GlyphOutline {
    let upem = units_per_em as f32;
    let mut out = Vec::new();
    for points in contours {
        let n = points.len();
        if n == 0 {
            continue;
        }
        let (start, sequence): (OutlinePoint, Vec<OutlinePoint>) =
            match points.iter().position(|p| p.on_curve) {
                Some(s) => (points[s], (1..=n).map(|i| points[(s + i) % n]).collect()),
                None => (midpoint(points[n - 1], points[0]), points.clone()),
            };

        out.push(GlyphCommand::MoveTo(start.x / upem, start.y / upem));
        let mut pending: Option<OutlinePoint> = None;
        let mut last = start;
        for q in sequence {
            if q.on_curve {
                match pending.take() {
                    Some(c) => out.push(quad(c, q, upem)),
                    None => out.push(GlyphCommand::LineTo(q.x / upem, q.y / upem)),
                }
                last = q;
            } else {
                if let Some(c) = pending {
                    let m = midpoint(c, q);
                    out.push(quad(c, m, upem));
                    last = m;
                }
                pending = Some(q);
            }
        }
        match pending {
            Some(c) => out.push(quad(c, start, upem)),
            None if last != start => out.push(GlyphCommand::LineTo(start.x / upem, start.y / upem)),
            None => {}
        }
    }
    out
}

fn quad(ctrl: OutlinePoint, to: OutlinePoint, upem: f32) -> GlyphCommand {
    GlyphCommand::QuadTo {
        ctrl_x: ctrl.x / upem,
        ctrl_y: ctrl.y / upem,
        to_x: to.x / upem,
        to_y: to.y / upem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(x: f32, y: f32) -> OutlinePoint {
        OutlinePoint { x, y, on_curve: true }
    }

    fn off(x: f32, y: f32) -> OutlinePoint {
        OutlinePoint { x, y, on_curve: false }
    }

    #[test]
    fn square_contour_closes_on_start() {
        let contour = vec![on(0.0, 0.0), on(0.0, 100.0), on(100.0, 100.0), on(100.0, 0.0)];
        let cmds = contours_to_commands(&[contour], 100);
        assert_eq!(cmds.first(), Some(&GlyphCommand::MoveTo(0.0, 0.0)));
        assert_eq!(cmds.last(), Some(&GlyphCommand::LineTo(0.0, 0.0)));
        assert_eq!(cmds.len(), 5);
    }

    #[test]
    fn consecutive_off_curve_points_get_implied_midpoint() {
        let contour = vec![on(0.0, 0.0), off(0.0, 100.0), off(100.0, 100.0), on(100.0, 0.0)];
        let cmds = contours_to_commands(&[contour], 100);
        assert_eq!(
            cmds[1],
            GlyphCommand::QuadTo { ctrl_x: 0.0, ctrl_y: 1.0, to_x: 0.5, to_y: 1.0 }
        );
        assert_eq!(
            cmds[2],
            GlyphCommand::QuadTo { ctrl_x: 1.0, ctrl_y: 1.0, to_x: 1.0, to_y: 0.0 }
        );
    }

    #[test]
    fn all_off_curve_contour_starts_between_last_and_first() {
        let contour = vec![off(0.0, 0.0), off(0.0, 100.0), off(100.0, 100.0), off(100.0, 0.0)];
        let cmds = contours_to_commands(&[contour], 100);
        assert_eq!(cmds[0], GlyphCommand::MoveTo(0.5, 0.0));
        match cmds.last() {
            Some(GlyphCommand::QuadTo { to_x, to_y, .. }) => assert_eq!((*to_x, *to_y), (0.5, 0.0)),
            other => panic!("unexpected closing command {other:?}"),
        }
    }
}
