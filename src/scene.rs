use std::collections::BTreeSet;

use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};

/// Position, heading and size of one model on the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation about the Y axis, in degrees.
    pub rotation_y: f32,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_y: 0.0,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation_y: f32, scale: Vec3) -> Self {
        Self {
            position,
            rotation_y,
            scale,
        }
    }

    /// translate * rotate(Y) * scale
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(self.rotation_y.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

/// A model file drawn once with a fixed transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub name: String,
    /// Model path relative to the asset root.
    pub model: String,
    pub transform: Transform,
}

impl Placement {
    pub fn new(name: &str, model: &str, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
            transform,
        }
    }
}

/// A row of identical pieces differing only in their X coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct PawnRow {
    pub name: String,
    pub model: String,
    pub files: Vec<f32>,
    pub y: f32,
    pub z: f32,
    pub rotation_y: f32,
    pub scale: Vec3,
}

impl PawnRow {
    pub fn expand(&self) -> impl Iterator<Item = Placement> + '_ {
        self.files.iter().map(move |&x| Placement {
            name: self.name.clone(),
            model: self.model.clone(),
            transform: Transform::new(Vec3::new(x, self.y, self.z), self.rotation_y, self.scale),
        })
    }
}

/// Everything drawn with the lighting program, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    pub board: Placement,
    pub pieces: Vec<Placement>,
}

const BOARD: &str = "Models/tablero.obj";
const CREEPER: &str = "Models/creeper.obj";
const SLIME: &str = "Models/slime.obj";
const SKELETON: &str = "Models/Esqueleto.obj";
const STEVE: &str = "Models/steve.obj";
const ALEX: &str = "Models/alex.obj";
const ZOMBIE: &str = "Models/zombie.obj";
const WALLNUT: &str = "Models/torrenuez.obj";
const CHOMPER: &str = "Models/caballocarni.obj";
const CACTUS: &str = "Models/alfilcactus.obj";
const SUNFLOWER: &str = "Models/Reina.obj";
const FRED: &str = "Models/Rey.obj";
const PEASHOOTER: &str = "Models/peonpeashooter.obj";

impl SceneLayout {
    /// The two themed armies facing each other across the board.
    pub fn chessboard() -> Self {
        let board = Placement::new(
            "Board",
            BOARD,
            Transform::new(Vec3::new(0.0, -4.0, 0.0), 0.0, Vec3::new(0.5, 1.0, 0.5)),
        );

        let tall = Vec3::new(2.5, 3.0, 2.5);
        let piece = |name: &str, model: &str, x: f32, y: f32, z: f32, rot: f32, scale: Vec3| {
            Placement::new(name, model, Transform::new(Vec3::new(x, y, z), rot, scale))
        };

        let mut pieces = vec![
            piece("Creeper rook", CREEPER, -28.0, 1.0, -28.0, 270.0, Vec3::splat(2.5)),
            piece("Slime knight", SLIME, -20.0, -2.0, -28.0, 270.0, Vec3::ONE),
            piece("Skeleton bishop", SKELETON, -12.0, 1.0, -28.0, 270.0, tall),
            piece("Steve king", STEVE, -4.0, -1.6, -28.0, 270.0, Vec3::ONE),
            piece("Alex queen", ALEX, 4.0, -1.6, -28.0, 270.0, Vec3::ONE),
            piece("Skeleton bishop", SKELETON, 12.0, 1.0, -28.0, 270.0, tall),
            piece("Slime knight", SLIME, 20.0, -2.0, -28.0, 270.0, Vec3::ONE),
            piece("Creeper rook", CREEPER, 28.0, 1.0, -28.0, 270.0, Vec3::splat(2.5)),
        ];
        let zombies = PawnRow {
            name: "Zombie pawn".to_string(),
            model: ZOMBIE.to_string(),
            files: vec![-28.0, -20.0, -12.0, -4.0, 4.0, 12.0, 20.0, 28.0],
            y: -1.6,
            z: -20.0,
            rotation_y: 270.0,
            scale: Vec3::ONE,
        };
        pieces.extend(zombies.expand());

        pieces.extend([
            piece("Wall-nut rook", WALLNUT, 28.0, -1.8, 28.0, 90.0, Vec3::splat(2.0)),
            piece("Chomper knight", CHOMPER, 20.0, -1.8, 28.0, 360.0, Vec3::splat(2.5)),
            piece("Cactus bishop", CACTUS, 12.0, -2.0, 28.0, 270.0, Vec3::splat(2.5)),
            piece("Sunflower queen", SUNFLOWER, 4.0, -1.8, 28.0, 270.0, Vec3::ONE),
            piece("Fred king", FRED, -4.0, -1.8, 28.0, 270.0, Vec3::ONE),
            piece("Cactus bishop", CACTUS, -12.0, -2.0, 28.0, 270.0, Vec3::splat(2.5)),
            piece("Chomper knight", CHOMPER, -20.0, -1.8, 28.0, 360.0, Vec3::splat(2.5)),
            piece("Wall-nut rook", WALLNUT, -28.0, -1.8, 28.0, 45.0, Vec3::splat(2.0)),
        ]);
        let peashooters = PawnRow {
            name: "Peashooter pawn".to_string(),
            model: PEASHOOTER.to_string(),
            files: vec![28.0, 20.0, 12.0, 4.0, -4.0, -12.0, -20.0, -28.0],
            y: -1.5,
            z: 20.0,
            rotation_y: 270.0,
            scale: Vec3::splat(3.0),
        };
        pieces.extend(peashooters.expand());

        Self { board, pieces }
    }

    /// Parses a layout description; see `<board>`, `<piece>` and `<row>`.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid layout XML")?;
        let root = document.root_element();
        if !root.has_tag_name("layout") {
            return Err(anyhow!(
                "expected <layout> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut board = None;
        let mut pieces = Vec::new();
        for node in root.children().filter(Node::is_element) {
            match node.tag_name().name() {
                "board" => {
                    if board.is_some() {
                        return Err(anyhow!("layout defines more than one <board>"));
                    }
                    board = Some(parse_placement(&node).context("invalid <board>")?);
                }
                "piece" => pieces.push(parse_placement(&node).context("invalid <piece>")?),
                "row" => {
                    let row = parse_row(&node).context("invalid <row>")?;
                    pieces.extend(row.expand());
                }
                other => log::warn!("ignoring unknown layout element <{other}>"),
            }
        }

        let board = board.ok_or_else(|| anyhow!("<board> tag is missing"))?;
        Ok(Self { board, pieces })
    }

    /// Board followed by every piece.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        std::iter::once(&self.board).chain(self.pieces.iter())
    }

    /// Distinct model paths, sorted, each loaded once at startup.
    pub fn model_paths(&self) -> Vec<&str> {
        self.placements()
            .map(|placement| placement.model.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn parse_placement(node: &Node<'_, '_>) -> Result<Placement> {
    let name = required_text(node, "name")?;
    let model = required_text(node, "model")?;
    let position = parse_vec3(optional_text(node, "position"), Vec3::ZERO)?;
    let rotation_y = parse_f32(optional_text(node, "rotation"), 0.0)?;
    let scale = parse_scale(optional_text(node, "scale"))?;
    Ok(Placement {
        name,
        model,
        transform: Transform::new(position, rotation_y, scale),
    })
}

fn parse_row(node: &Node<'_, '_>) -> Result<PawnRow> {
    let files = required_text(node, "files")?
        .split_whitespace()
        .map(|value| {
            value
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid file coordinate {value:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PawnRow {
        name: required_text(node, "name")?,
        model: required_text(node, "model")?,
        files,
        y: parse_f32(optional_text(node, "y"), 0.0)?,
        z: parse_f32(optional_text(node, "z"), 0.0)?,
        rotation_y: parse_f32(optional_text(node, "rotation"), 0.0)?,
        scale: parse_scale(optional_text(node, "scale"))?,
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_numbers(value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse number {component:?}: {err}"))
        })
        .collect()
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_numbers(&value)?.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("vector {value:?} must have 3 components")),
    }
}

/// A scale is either uniform (`2.5`) or per axis (`2.5 3 2.5`).
fn parse_scale(value: Option<String>) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(Vec3::ONE);
    };
    match parse_numbers(&value)?.as_slice() {
        [s] => Ok(Vec3::splat(*s)),
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("scale {value:?} must have 1 or 3 components")),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float {value:?}: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn model_matrix_is_translate_rotate_scale() {
        let transform = Transform::new(Vec3::new(4.0, -1.6, -28.0), 270.0, Vec3::ONE);
        let expected = Mat4::from_translation(transform.position)
            * Mat4::from_rotation_y(270.0_f32.to_radians())
            * Mat4::from_scale(Vec3::ONE);
        let point = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let got = transform.matrix() * point;
        let want = expected * point;
        assert!((got - want).abs().max_element() < 1e-4);
        // rotating +X by 270 degrees about Y points it along +Z
        assert!((got.truncate() - Vec3::new(4.0, -1.6, -27.0)).abs().max_element() < 1e-4);
    }

    #[test]
    fn scale_is_applied_before_rotation() {
        let transform = Transform::new(Vec3::ZERO, 90.0, Vec3::new(2.0, 1.0, 1.0));
        let got = transform.matrix().transform_point3(Vec3::X);
        assert!((got - Vec3::new(0.0, 0.0, -2.0)).abs().max_element() < 1e-4);
    }

    #[test]
    fn chessboard_has_two_full_armies() {
        let layout = SceneLayout::chessboard();
        assert_eq!(layout.pieces.len(), 32);
        let minecraft = layout.pieces.iter().filter(|p| p.transform.position.z < 0.0);
        assert_eq!(minecraft.count(), 16);
        let pawns: Vec<_> = layout
            .pieces
            .iter()
            .filter(|p| p.model == PEASHOOTER)
            .collect();
        assert_eq!(pawns.len(), 8);
        assert!(pawns
            .iter()
            .all(|p| p.transform.position.z == 20.0 && p.transform.scale == Vec3::splat(3.0)));
        assert_eq!(layout.model_paths().len(), 13);
        assert_eq!(layout.board.transform.scale, Vec3::new(0.5, 1.0, 0.5));
    }

    #[test]
    fn pawn_row_expands_in_file_order() {
        let row = PawnRow {
            name: "Pawn".into(),
            model: "pawn.obj".into(),
            files: vec![3.0, 1.0],
            y: -1.0,
            z: 5.0,
            rotation_y: 90.0,
            scale: Vec3::splat(2.0),
        };
        let placements: Vec<_> = row.expand().collect();
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].transform.position, Vec3::new(3.0, -1.0, 5.0));
        assert_eq!(placements[1].transform.position, Vec3::new(1.0, -1.0, 5.0));
        assert_eq!(placements[1].transform.rotation_y, 90.0);
    }

    const SAMPLE: &str = r#"
    <layout>
        <board>
            <name>Board</name>
            <model>Models/board.obj</model>
            <position>0 -4 0</position>
            <scale>0.5 1 0.5</scale>
        </board>
        <piece>
            <name>Rook</name>
            <model>Models/rook.obj</model>
            <position>-28 1 -28</position>
            <rotation>270</rotation>
            <scale>2.5</scale>
        </piece>
        <row>
            <name>Pawn</name>
            <model>Models/pawn.obj</model>
            <files>-4 4</files>
            <y>-1.6</y>
            <z>-20</z>
        </row>
    </layout>
    "#;

    #[test]
    fn parse_layout_populates_board_pieces_and_rows() {
        let layout = SceneLayout::from_xml(SAMPLE).unwrap();
        assert_eq!(layout.board.model, "Models/board.obj");
        assert_eq!(layout.pieces.len(), 3);
        let rook = &layout.pieces[0];
        assert_eq!(rook.transform.scale, Vec3::splat(2.5));
        assert_eq!(rook.transform.rotation_y, 270.0);
        let pawn = &layout.pieces[2];
        assert_eq!(pawn.transform.position, Vec3::new(4.0, -1.6, -20.0));
        assert_eq!(pawn.transform.scale, Vec3::ONE);
        assert_eq!(layout.model_paths().len(), 3);
    }

    #[test]
    fn missing_board_is_an_error() {
        let bad = "<layout><piece><name>a</name><model>a.obj</model></piece></layout>";
        assert!(SceneLayout::from_xml(bad).is_err());
    }

    #[test]
    fn missing_model_is_an_error() {
        let bad = "<layout><board><name>Board</name></board></layout>";
        assert!(SceneLayout::from_xml(bad).is_err());
    }

    #[test]
    fn malformed_scale_is_an_error() {
        let bad = "<layout><board><name>B</name><model>b.obj</model>\
                   <scale>1 2</scale></board></layout>";
        assert!(SceneLayout::from_xml(bad).is_err());
    }

    #[test]
    fn wrong_root_is_an_error() {
        assert!(SceneLayout::from_xml("<scene></scene>").is_err());
    }
}
