//! Skeleton and animation resources
//!
//! A skeleton file pairs a 3DMF scene (the limb meshes) with a
//! resource fork describing bones, bind-pose point ownership, and
//! keyframed animations. All resource payloads are big-endian.
//!
//! Limb meshes share vertices along joint seams. The loader first
//! decomposes them into global point and normal tables (fuzzy-matched
//! so a seam vertex appears once) and the bone index lists then refer
//! into those tables.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use glam::Vec3;

use crate::error::{Error, Result};
use crate::formats::resource_fork::ResourceFork;
use crate::mesh::Mesh;

const HEDR: [u8; 4] = *b"Hedr";
const BONE: [u8; 4] = *b"Bone";
const BONP: [u8; 4] = *b"BonP";
const BONN: [u8; 4] = *b"BonN";
const RELP: [u8; 4] = *b"RelP";
const ANHD: [u8; 4] = *b"AnHd";
const EVNT: [u8; 4] = *b"Evnt";
const NUMK: [u8; 4] = *b"NumK";
const KEYF: [u8; 4] = *b"KeyF";

const SUPPORTED_VERSION: u16 = 0x0110;

/// Points whose coordinates each differ by less than this collapse
/// into one decomposed point.
const POINT_MATCH_EPSILON: f32 = 0.001;
/// Per-component tolerance for normal dedup; looser, directions from
/// independently authored parts carry more noise.
const NORMAL_MATCH_EPSILON: f32 = 0.02;

/// One occurrence of a decomposed point or normal in a limb mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRef {
    /// Limb mesh index.
    pub mesh: usize,
    /// Vertex index within that mesh.
    pub vertex: usize,
}

/// A bind-pose point shared by every limb vertex within matching
/// distance of it.
#[derive(Debug, Clone)]
pub struct DecomposedPoint {
    pub point: Vec3,
    pub mesh_refs: Vec<MeshRef>,
}

/// A deduplicated bind-pose normal.
#[derive(Debug, Clone)]
pub struct DecomposedNormal {
    pub normal: Vec3,
    pub mesh_refs: Vec<MeshRef>,
}

/// One bone: its rest-pose coordinate plus the decomposed points and
/// normals it drives.
#[derive(Debug, Clone)]
pub struct Bone {
    /// Parent bone index, `None` for the root.
    pub parent: Option<usize>,
    pub name: String,
    pub coord: Vec3,
    /// Indices into the decomposed point table.
    pub point_indices: Vec<u16>,
    /// Indices into the decomposed normal table.
    pub normal_indices: Vec<u16>,
}

/// A timed animation event (sound trigger, footstep, loop marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimEvent {
    pub time: i16,
    pub kind: u8,
    pub value: u8,
}

/// One keyframe for one joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub tick: i32,
    pub acceleration_mode: i32,
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

/// A named animation: events plus a keyframe track per joint.
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub events: Vec<AnimEvent>,
    /// Indexed by joint, then keyframe order.
    pub tracks: Vec<Vec<Keyframe>>,
}

/// A fully loaded skeleton definition.
#[derive(Debug, Clone)]
pub struct SkeletonDefinition {
    pub bones: Vec<Bone>,
    pub points: Vec<DecomposedPoint>,
    pub normals: Vec<DecomposedNormal>,
    /// Per decomposed point, its offset from the owning bone's coord.
    pub relative_points: Vec<Vec3>,
    pub animations: Vec<Animation>,
}

impl SkeletonDefinition {
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.bones.len()
    }
}

/// Load a skeleton from its limb meshes and the raw bytes of its
/// resource file (AppleDouble or AppleSingle wrapped).
pub fn parse(meshes: &[Mesh], data: &[u8]) -> Result<SkeletonDefinition> {
    let fork = ResourceFork::parse(data)?;

    let mut header = Cursor::new(fork.get(data, HEDR, 1000)?);
    let version = header.read_u16::<BigEndian>()?;
    if version != SUPPORTED_VERSION {
        return Err(Error::UnsupportedSkeletonVersion(version));
    }
    let num_anims = usize::from(header.read_u16::<BigEndian>()?);
    let num_joints = usize::from(header.read_u16::<BigEndian>()?);
    let _num_limbs = usize::from(header.read_u16::<BigEndian>()?);

    let (points, normals) = decompose(meshes);

    let mut bones = Vec::with_capacity(num_joints);
    for bone_index in 0..num_joints {
        let id = resource_id(1000 + bone_index);
        let mut cursor = Cursor::new(fork.get(data, BONE, id)?);
        let parent = cursor.read_i32::<BigEndian>()?;
        let parent = match parent {
            -1 => None,
            p if p >= 0 && (p as usize) < bone_index => Some(p as usize),
            p => {
                return Err(Error::InvalidBoneParent {
                    bone: bone_index,
                    parent: p,
                })
            }
        };
        let mut name_bytes = [0u8; 32];
        for slot in &mut name_bytes {
            *slot = cursor.read_u8()?;
        }
        let name = bytes_to_c_string(&name_bytes);
        let coord = read_vec3(&mut cursor)?;
        let num_points = usize::from(cursor.read_u16::<BigEndian>()?);
        let num_normals = usize::from(cursor.read_u16::<BigEndian>()?);

        let point_indices =
            read_index_list(fork.get(data, BONP, id)?, num_points, bone_index, "point", points.len())?;
        let normal_indices = read_index_list(
            fork.get(data, BONN, id)?,
            num_normals,
            bone_index,
            "normal",
            normals.len(),
        )?;

        bones.push(Bone {
            parent,
            name,
            coord,
            point_indices,
            normal_indices,
        });
    }

    let relative_data = fork.get(data, RELP, 1000)?;
    let float_count = relative_data.len() / 4;
    if float_count != points.len() * 3 {
        return Err(Error::RelativePointCountMismatch {
            expected: points.len() * 3,
            actual: float_count,
            points: points.len(),
        });
    }
    let mut cursor = Cursor::new(relative_data);
    let mut relative_points = Vec::with_capacity(points.len());
    for _ in 0..points.len() {
        relative_points.push(read_vec3(&mut cursor)?);
    }

    let mut animations = Vec::with_capacity(num_anims);
    for anim_index in 0..num_anims {
        let id = resource_id(1000 + anim_index);
        let mut cursor = Cursor::new(fork.get(data, ANHD, id)?);
        let name = read_pascal_string(&mut cursor)?;
        let num_events = usize::from(cursor.read_u16::<BigEndian>()?);

        let mut events = Vec::with_capacity(num_events);
        if num_events > 0 {
            let mut cursor = Cursor::new(fork.get(data, EVNT, id)?);
            for _ in 0..num_events {
                events.push(AnimEvent {
                    time: cursor.read_i16::<BigEndian>()?,
                    kind: cursor.read_u8()?,
                    value: cursor.read_u8()?,
                });
            }
        }

        let key_counts = fork.get(data, NUMK, id)?;
        let mut tracks = Vec::with_capacity(num_joints);
        for joint in 0..num_joints {
            let count = usize::from(*key_counts.get(joint).unwrap_or(&0));
            let keyframe_id = resource_id(1000 + anim_index * 100 + joint);
            let mut track = Vec::with_capacity(count);
            if count > 0 {
                let mut cursor = Cursor::new(fork.get(data, KEYF, keyframe_id)?);
                for _ in 0..count {
                    track.push(Keyframe {
                        tick: cursor.read_i32::<BigEndian>()?,
                        acceleration_mode: cursor.read_i32::<BigEndian>()?,
                        translation: read_vec3(&mut cursor)?,
                        rotation: read_vec3(&mut cursor)?,
                        scale: read_vec3(&mut cursor)?,
                    });
                }
            }
            tracks.push(track);
        }

        animations.push(Animation {
            name,
            events,
            tracks,
        });
    }

    tracing::debug!(
        bones = bones.len(),
        points = points.len(),
        animations = animations.len(),
        "parsed skeleton"
    );
    Ok(SkeletonDefinition {
        bones,
        points,
        normals,
        relative_points,
        animations,
    })
}

/// Build the global point and normal tables from the limb meshes.
///
/// Matching is a linear first-match scan so a vertex shared between two
/// limbs lands on a single decomposed point carrying both refs.
fn decompose(meshes: &[Mesh]) -> (Vec<DecomposedPoint>, Vec<DecomposedNormal>) {
    let mut points: Vec<DecomposedPoint> = Vec::new();
    let mut normals: Vec<DecomposedNormal> = Vec::new();

    for (mesh_index, mesh) in meshes.iter().enumerate() {
        for vertex in 0..mesh.vertices.len() {
            let position = mesh.vertices.position(vertex);
            let reference = MeshRef {
                mesh: mesh_index,
                vertex,
            };
            match points
                .iter_mut()
                .find(|p| (p.point - position).abs().max_element() < POINT_MATCH_EPSILON)
            {
                Some(existing) => existing.mesh_refs.push(reference),
                None => points.push(DecomposedPoint {
                    point: position,
                    mesh_refs: vec![reference],
                }),
            }

            if mesh.normals.len() >= (vertex + 1) * 3 {
                let normal = Vec3::new(
                    mesh.normals[vertex * 3],
                    mesh.normals[vertex * 3 + 1],
                    mesh.normals[vertex * 3 + 2],
                );
                match normals
                    .iter_mut()
                    .find(|n| (n.normal - normal).abs().max_element() < NORMAL_MATCH_EPSILON)
                {
                    Some(existing) => existing.mesh_refs.push(reference),
                    None => normals.push(DecomposedNormal {
                        normal,
                        mesh_refs: vec![reference],
                    }),
                }
            }
        }
    }

    (points, normals)
}

fn read_index_list(
    data: &[u8],
    count: usize,
    bone: usize,
    table: &'static str,
    len: usize,
) -> Result<Vec<u16>> {
    let mut cursor = Cursor::new(data);
    let mut indices = Vec::with_capacity(count);
    for _ in 0..count {
        let index = cursor.read_u16::<BigEndian>()?;
        if usize::from(index) >= len {
            return Err(Error::BoneRefOutOfRange {
                bone,
                table,
                index,
                len,
            });
        }
        indices.push(index);
    }
    Ok(indices)
}

fn read_vec3(cursor: &mut Cursor<&[u8]>) -> Result<Vec3> {
    Ok(Vec3::new(
        cursor.read_f32::<BigEndian>()?,
        cursor.read_f32::<BigEndian>()?,
        cursor.read_f32::<BigEndian>()?,
    ))
}

fn read_pascal_string(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = usize::from(cursor.read_u8()?);
    let mut bytes = vec![0u8; len];
    for slot in &mut bytes {
        *slot = cursor.read_u8()?;
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn bytes_to_c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn resource_id(value: usize) -> i16 {
    value as i16
}
