use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::{debug, warn};
use wgpu::util::DeviceExt;

use crate::obj::{load_obj_from_str, parse_mtl, MtlMaterial, ObjMesh, VERTEX_STRIDE};
use crate::render::shaders::{LAMP_CUBE_VERTICES, LAMP_VERTEX_STRIDE};

/// Sampled 2D texture and its default view.
pub struct Texture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Texture {
    /// Decodes an image file into an RGBA texture.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        srgb: bool,
    ) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("unable to decode texture {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let label = path.display().to_string();
        Ok(Self::from_rgba(device, queue, &label, width, height, &image, srgb))
    }

    /// 1x1 texture of a single colour.
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        color: [u8; 4],
        srgb: bool,
    ) -> Self {
        Self::from_rgba(device, queue, label, 1, 1, &color, srgb)
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        srgb: bool,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: if srgb {
                wgpu::TextureFormat::Rgba8UnormSrgb
            } else {
                wgpu::TextureFormat::Rgba8Unorm
            },
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Converts a linear colour in `0..=1` to opaque RGBA8.
pub fn color_to_rgba8(color: Vec3) -> [u8; 4] {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(color.x), channel(color.y), channel(color.z), 255]
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
    material: usize,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &ObjMesh, label: &str, material: usize) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
            material,
        }
    }
}

struct Material {
    _diffuse: Texture,
    _specular: Texture,
    bind_group: wgpu::BindGroup,
}

/// GPU geometry plus the material bind groups its meshes reference.
pub struct Model {
    meshes: Vec<MeshBuffers>,
    materials: Vec<Material>,
}

impl Model {
    /// Issues one indexed draw per mesh, binding its material at group 2.
    /// The caller sets the pipeline and groups 0 and 1.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        for mesh in &self.meshes {
            pass.set_bind_group(2, &self.materials[mesh.material].bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex.slice(..));
            pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

/// Everything needed to turn OBJ/MTL files into [`Model`]s.
pub struct ModelLoader<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub material_layout: &'a wgpu::BindGroupLayout,
    pub sampler: &'a wgpu::Sampler,
}

impl ModelLoader<'_> {
    /// Loads an OBJ file together with its material library and textures,
    /// all resolved relative to the OBJ's directory.
    pub fn load(&self, path: &Path) -> Result<Model> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let obj = load_obj_from_str(&source)
            .with_context(|| format!("failed to parse OBJ mesh {}", path.display()))?;
        if obj.meshes.is_empty() {
            return Err(anyhow!("{} does not contain any faces", path.display()));
        }
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let library = match obj.material_library.as_deref() {
            Some(name) => self.load_library(&dir.join(name)),
            None => HashMap::new(),
        };

        let label = path.display().to_string();
        let mut materials = Vec::new();
        let mut material_slots: HashMap<Option<String>, usize> = HashMap::new();
        let mut meshes = Vec::with_capacity(obj.meshes.len());
        for mesh in &obj.meshes {
            let slot = match material_slots.get(&mesh.material) {
                Some(slot) => *slot,
                None => {
                    let description = mesh
                        .material
                        .as_ref()
                        .and_then(|name| library.get(name))
                        .cloned()
                        .unwrap_or_default();
                    materials.push(self.material(&description, dir, &label));
                    material_slots.insert(mesh.material.clone(), materials.len() - 1);
                    materials.len() - 1
                }
            };
            meshes.push(MeshBuffers::from_mesh(self.device, mesh, &label, slot));
        }
        debug!(
            "loaded {} ({} meshes, {} materials)",
            path.display(),
            meshes.len(),
            materials.len()
        );
        Ok(Model { meshes, materials })
    }

    /// White cube standing in for a model that failed to load.
    pub fn placeholder(&self) -> Model {
        let mesh = placeholder_mesh();
        let material = self.material(&MtlMaterial::default(), Path::new(""), "placeholder");
        Model {
            meshes: vec![MeshBuffers::from_mesh(self.device, &mesh, "placeholder", 0)],
            materials: vec![material],
        }
    }

    fn load_library(&self, path: &Path) -> HashMap<String, MtlMaterial> {
        let parsed = fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))
            .and_then(|source| parse_mtl(&source));
        match parsed {
            Ok(library) => library,
            Err(err) => {
                warn!("material library {} ignored: {err:#}", path.display());
                HashMap::new()
            }
        }
    }

    fn material(&self, description: &MtlMaterial, dir: &Path, label: &str) -> Material {
        let diffuse = self.texture_or(
            description.diffuse_map.as_deref(),
            dir,
            color_to_rgba8(description.diffuse_color),
            true,
            &format!("{label}-diffuse"),
        );
        let specular = self.texture_or(
            description.specular_map.as_deref(),
            dir,
            [0, 0, 0, 255],
            false,
            &format!("{label}-specular"),
        );
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-material")),
            layout: self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(self.sampler),
                },
            ],
        });
        Material {
            _diffuse: diffuse,
            _specular: specular,
            bind_group,
        }
    }

    fn texture_or(
        &self,
        file: Option<&str>,
        dir: &Path,
        fallback: [u8; 4],
        srgb: bool,
        label: &str,
    ) -> Texture {
        if let Some(file) = file {
            match Texture::load(self.device, self.queue, &dir.join(file), srgb) {
                Ok(texture) => return texture,
                Err(err) => warn!("{err:#}, using a solid colour"),
            }
        }
        Texture::solid(self.device, self.queue, label, fallback, srgb)
    }
}

/// The lamp cube re-laid as a model mesh with zero texture coordinates.
pub fn placeholder_mesh() -> ObjMesh {
    let vertex_count = LAMP_CUBE_VERTICES.len() / LAMP_VERTEX_STRIDE;
    let mut vertices = Vec::with_capacity(vertex_count * VERTEX_STRIDE);
    for vertex in LAMP_CUBE_VERTICES.chunks_exact(LAMP_VERTEX_STRIDE) {
        vertices.extend_from_slice(vertex);
        vertices.extend_from_slice(&[0.0, 0.0]);
    }
    let indices = (0..(vertices.len() / VERTEX_STRIDE) as u32).collect();
    ObjMesh {
        vertices,
        indices,
        material: None,
    }
}
