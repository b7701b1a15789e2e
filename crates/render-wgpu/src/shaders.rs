/// Maximum number of point lights uploaded per frame. Must match `MAX_POINT_LIGHTS`
/// in [`MESH_SHADER`].
pub const MAX_POINT_LIGHTS: usize = 8;

/// WGSL shader for Lambert-lit instanced meshes.
pub const MESH_SHADER: &str = r#"
const MAX_POINT_LIGHTS: u32 = 8u;

struct PointLight {
    position: vec3<f32>,
    distance: f32,
    color: vec3<f32>,
    decay: f32,
};

struct Uniforms {
    view_proj: mat4x4<f32>,
    ambient: vec4<f32>,
    point_light_count: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
    point_lights: array<PointLight, MAX_POINT_LIGHTS>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color;
    return out;
}

fn attenuation(light: PointLight, d: f32) -> f32 {
    if (light.distance <= 0.0) {
        return 1.0;
    }
    return pow(clamp(1.0 - d / light.distance, 0.0, 1.0), light.decay);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    var irradiance = uniforms.ambient.rgb;
    let count = min(uniforms.point_light_count, MAX_POINT_LIGHTS);
    for (var i = 0u; i < count; i = i + 1u) {
        let light = uniforms.point_lights[i];
        let to_light = light.position - in.world_position;
        let d = length(to_light);
        let lambert = max(dot(n, to_light / max(d, 1e-4)), 0.0);
        irradiance = irradiance + light.color * lambert * attenuation(light, d);
    }
    return vec4<f32>(in.color.rgb * irradiance, in.color.a);
}
"#;
