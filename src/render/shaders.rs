//! WGSL sources and the lamp cube geometry.

/// Phong shading with one directional light, four point lights and a
/// spotlight, sampling diffuse and specular maps.
pub const LIGHTING_SHADER: &str = r#"
struct CameraUniform {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

struct DirLight {
    direction: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
}

struct PointLight {
    position: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    attenuation: vec4<f32>,
}

struct SpotLight {
    position: vec4<f32>,
    direction: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    attenuation: vec4<f32>,
    cut_off: vec4<f32>,
}

struct LightsUniform {
    view_position: vec4<f32>,
    dir_light: DirLight,
    point_lights: array<PointLight, 4>,
    spot_light: SpotLight,
    material: vec4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
}

@group(0) @binding(0)
var<uniform> camera: CameraUniform;

@group(0) @binding(1)
var<uniform> lights: LightsUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

@group(2) @binding(0)
var diffuse_map: texture_2d<f32>;
@group(2) @binding(1)
var specular_map: texture_2d<f32>;
@group(2) @binding(2)
var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = camera.projection * camera.view * world_position;
    out.world_pos = world_position.xyz;
    out.normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;
    out.uv = input.uv;
    return out;
}

struct Surface {
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    shininess: f32,
}

fn specular_term(light_dir: vec3<f32>, normal: vec3<f32>, view_dir: vec3<f32>, shininess: f32) -> f32 {
    let reflect_dir = reflect(-light_dir, normal);
    return pow(max(dot(view_dir, reflect_dir), 0.0), shininess);
}

fn attenuate(attenuation: vec4<f32>, distance: f32) -> f32 {
    return 1.0 / (attenuation.x + attenuation.y * distance + attenuation.z * distance * distance);
}

fn dir_light(light: DirLight, normal: vec3<f32>, view_dir: vec3<f32>, surface: Surface) -> vec3<f32> {
    let light_dir = normalize(-light.direction.xyz);
    let diff = max(dot(normal, light_dir), 0.0);
    let spec = specular_term(light_dir, normal, view_dir, surface.shininess);
    return light.ambient.xyz * surface.diffuse
        + light.diffuse.xyz * diff * surface.diffuse
        + light.specular.xyz * spec * surface.specular;
}

fn point_light(light: PointLight, normal: vec3<f32>, frag_pos: vec3<f32>, view_dir: vec3<f32>, surface: Surface) -> vec3<f32> {
    let light_dir = normalize(light.position.xyz - frag_pos);
    let diff = max(dot(normal, light_dir), 0.0);
    let spec = specular_term(light_dir, normal, view_dir, surface.shininess);
    let falloff = attenuate(light.attenuation, length(light.position.xyz - frag_pos));
    return (light.ambient.xyz * surface.diffuse
        + light.diffuse.xyz * diff * surface.diffuse
        + light.specular.xyz * spec * surface.specular) * falloff;
}

fn spot_light(light: SpotLight, normal: vec3<f32>, frag_pos: vec3<f32>, view_dir: vec3<f32>, surface: Surface) -> vec3<f32> {
    let light_dir = normalize(light.position.xyz - frag_pos);
    let diff = max(dot(normal, light_dir), 0.0);
    let spec = specular_term(light_dir, normal, view_dir, surface.shininess);
    let falloff = attenuate(light.attenuation, length(light.position.xyz - frag_pos));
    let theta = dot(light_dir, normalize(-light.direction.xyz));
    // inner and outer cones coincide, keep the soft edge finite
    let epsilon = max(light.cut_off.x - light.cut_off.y, 1e-4);
    let intensity = clamp((theta - light.cut_off.y) / epsilon, 0.0, 1.0);
    return (light.ambient.xyz * surface.diffuse
        + light.diffuse.xyz * diff * surface.diffuse * intensity
        + light.specular.xyz * spec * surface.specular * intensity) * falloff;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let view_dir = normalize(lights.view_position.xyz - input.world_pos);
    var surface: Surface;
    surface.diffuse = textureSample(diffuse_map, material_sampler, input.uv).rgb;
    surface.specular = textureSample(specular_map, material_sampler, input.uv).rgb;
    surface.shininess = lights.material.x;

    var color = dir_light(lights.dir_light, normal, view_dir, surface);
    for (var i = 0u; i < 4u; i = i + 1u) {
        color += point_light(lights.point_lights[i], normal, input.world_pos, view_dir, surface);
    }
    color += spot_light(lights.spot_light, normal, input.world_pos, view_dir, surface);
    return vec4<f32>(color, 1.0);
}
"#;

/// Unlit white cube marking each point light.
pub const LAMP_SHADER: &str = r#"
struct CameraUniform {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
}

@group(0) @binding(0)
var<uniform> camera: CameraUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return camera.projection * camera.view * object.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

/// Floats per lamp cube vertex: `position.xyz`, `normal.xyz`.
pub const LAMP_VERTEX_STRIDE: usize = 6;
pub const LAMP_VERTEX_COUNT: u32 = 36;

/// Unit cube centred on the origin as 12 unindexed triangles.
#[rustfmt::skip]
pub const LAMP_CUBE_VERTICES: [f32; 36 * LAMP_VERTEX_STRIDE] = [
    // back
    -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,
     0.5, -0.5, -0.5,  0.0,  0.0, -1.0,
     0.5,  0.5, -0.5,  0.0,  0.0, -1.0,
     0.5,  0.5, -0.5,  0.0,  0.0, -1.0,
    -0.5,  0.5, -0.5,  0.0,  0.0, -1.0,
    -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,
    // front
    -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,
     0.5, -0.5,  0.5,  0.0,  0.0,  1.0,
     0.5,  0.5,  0.5,  0.0,  0.0,  1.0,
     0.5,  0.5,  0.5,  0.0,  0.0,  1.0,
    -0.5,  0.5,  0.5,  0.0,  0.0,  1.0,
    -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,
    // left
    -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,
    -0.5,  0.5, -0.5, -1.0,  0.0,  0.0,
    -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,
    -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,
    -0.5, -0.5,  0.5, -1.0,  0.0,  0.0,
    -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,
    // right
     0.5,  0.5,  0.5,  1.0,  0.0,  0.0,
     0.5,  0.5, -0.5,  1.0,  0.0,  0.0,
     0.5, -0.5, -0.5,  1.0,  0.0,  0.0,
     0.5, -0.5, -0.5,  1.0,  0.0,  0.0,
     0.5, -0.5,  0.5,  1.0,  0.0,  0.0,
     0.5,  0.5,  0.5,  1.0,  0.0,  0.0,
    // bottom
    -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,
     0.5, -0.5, -0.5,  0.0, -1.0,  0.0,
     0.5, -0.5,  0.5,  0.0, -1.0,  0.0,
     0.5, -0.5,  0.5,  0.0, -1.0,  0.0,
    -0.5, -0.5,  0.5,  0.0, -1.0,  0.0,
    -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,
    // top
    -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,
     0.5,  0.5, -0.5,  0.0,  1.0,  0.0,
     0.5,  0.5,  0.5,  0.0,  1.0,  0.0,
     0.5,  0.5,  0.5,  0.0,  1.0,  0.0,
    -0.5,  0.5,  0.5,  0.0,  1.0,  0.0,
    -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,
];

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn lamp_cube_is_a_closed_unit_cube() {
        let vertices: Vec<&[f32]> = LAMP_CUBE_VERTICES
            .chunks_exact(LAMP_VERTEX_STRIDE)
            .collect();
        assert_eq!(vertices.len(), LAMP_VERTEX_COUNT as usize);
        for vertex in vertices {
            let position = Vec3::from_slice(&vertex[..3]);
            let normal = Vec3::from_slice(&vertex[3..]);
            assert_eq!(position.abs(), Vec3::splat(0.5));
            assert_eq!(normal.length(), 1.0);
            // every corner lies on the face its normal points at
            assert_eq!(position.dot(normal), 0.5);
        }
    }

    #[test]
    fn lighting_shader_declares_the_bindings_the_renderer_creates() {
        for binding in [
            "@group(0) @binding(0)",
            "@group(0) @binding(1)",
            "@group(1) @binding(0)",
            "@group(2) @binding(0)",
            "@group(2) @binding(1)",
            "@group(2) @binding(2)",
        ] {
            assert!(LIGHTING_SHADER.contains(binding), "missing {binding}");
        }
        assert!(LIGHTING_SHADER.contains("array<PointLight, 4>"));
        assert!(!LAMP_SHADER.contains("@group(2)"));
    }
}
