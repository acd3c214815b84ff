//! Invocable scene methods

use reflect_mcp::BridgeConfig;
use reflect_mcp::MethodBuilder;
use reflect_mcp::Reflector;
use reflect_mcp::method::MethodInfo;
use serde_json::json;

use crate::scene::Color;
use crate::scene::GameObject;
use crate::scene::Light;
use crate::scene::Material;
use crate::scene::MeshRenderer;
use crate::scene::Transform;
use crate::scene::Vec3;

/// Euler angles, in degrees, that turn `from` towards `to`
fn look_rotation(from: Vec3, to: Vec3, world_up: Vec3) -> Vec3 {
    let direction = to.minus(from);
    let yaw = direction.x.atan2(direction.z).to_degrees();
    let pitch = (-direction.y).atan2(direction.x.hypot(direction.z)).to_degrees();
    let roll = if world_up.y < 0.0 { 180.0 } else { 0.0 };
    Vec3::new(pitch, yaw, roll)
}

/// Every method the scene exposes
pub fn scene_methods() -> Vec<MethodInfo> {
    vec![
        MethodBuilder::instance::<Transform>("LookAt")
            .describe("Rotate to face a point")
            .param::<Vec3>("target")
            .build_on(|_cx, transform: &mut Transform, args| {
                let target = *args.get::<Vec3>(0)?;
                transform.rotation = look_rotation(transform.position, target, Vec3::UP);
                Ok(None)
            }),
        MethodBuilder::instance::<Transform>("LookAt")
            .describe("Rotate to face another transform")
            .param::<Transform>("target")
            .param_with_default::<Vec3>("worldUp", json!({ "x": 0.0, "y": 1.0, "z": 0.0 }))
            .build_on(|_cx, transform: &mut Transform, args| {
                let target = args.get::<Transform>(0)?.position;
                let world_up = *args.get::<Vec3>(1)?;
                transform.rotation = look_rotation(transform.position, target, world_up);
                Ok(None)
            }),
        MethodBuilder::instance::<Transform>("Translate")
            .param::<Vec3>("offset")
            .returns::<Vec3>()
            .build_on(|_cx, transform: &mut Transform, args| {
                let offset = args.get::<Vec3>(0)?;
                transform.position.x += offset.x;
                transform.position.y += offset.y;
                transform.position.z += offset.z;
                Ok(Some(Box::new(transform.position)))
            }),
        MethodBuilder::static_on::<Vec3>("Distance")
            .param::<Vec3>("a")
            .param::<Vec3>("b")
            .returns::<f32>()
            .build(|_cx, _target, args| {
                let a = *args.get::<Vec3>(0)?;
                let b = *args.get::<Vec3>(1)?;
                Ok(Some(Box::new(a.minus(b).length())))
            }),
        MethodBuilder::instance::<Light>("Configure")
            .describe("Reset the light; every setting has a default")
            .param_with_default::<f32>("intensity", json!(1.0))
            .param_with_default::<bool>("enabled", json!(true))
            .param_with_default::<Color>("color", json!({ "r": 1.0, "g": 1.0, "b": 1.0, "a": 1.0 }))
            .build_on(|_cx, light: &mut Light, args| {
                light.intensity = *args.get::<f32>(0)?;
                light.enabled = *args.get::<bool>(1)?;
                light.color = *args.get::<Color>(2)?;
                Ok(None)
            }),
        MethodBuilder::instance::<GameObject>("SetActive")
            .param::<bool>("value")
            .build_on(|_cx, entity: &mut GameObject, args| {
                entity.is_active = *args.get::<bool>(0)?;
                Ok(None)
            }),
        MethodBuilder::instance::<Material>("Bake")
            .describe("Bake the material's lighting; completes on a later host update")
            .param_with_default::<i32>("samples", json!(16))
            .build_on(|cx, material: &mut Material, args| {
                let samples = *args.get::<i32>(0)?;
                let signal =
                    cx.begin_operation(format!("bake '{}' at {samples} samples", material.name))?;
                cx.host_mut().hold(signal);
                Ok(None)
            }),
    ]
}

/// Reflector with every scene type and method registered
pub fn scene_reflector(config: BridgeConfig) -> Reflector {
    let builder = Reflector::builder()
        .config(config)
        .register_type::<GameObject>()
        .register_type::<Transform>()
        .register_type::<Light>()
        .register_type::<MeshRenderer>()
        .register_type::<Material>();
    scene_methods()
        .into_iter()
        .fold(builder, reflect_mcp::marshal::ReflectorBuilder::method)
        .build()
}
