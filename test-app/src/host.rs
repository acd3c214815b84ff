//! In-memory scene host: a handle table of entities, components and assets

use std::collections::BTreeMap;

use reflect_mcp::Error;
use reflect_mcp::Handle;
use reflect_mcp::Host;
use reflect_mcp::Reflect;
use reflect_mcp::host::CompletionSignal;
use reflect_mcp::reflect::TypeName;
use tracing::debug;

use crate::scene::Color;
use crate::scene::GameObject;
use crate::scene::Light;
use crate::scene::LightKind;
use crate::scene::Material;
use crate::scene::MeshRenderer;
use crate::scene::Transform;
use crate::scene::Vec3;

/// Handles of the objects in [`SceneHost::demo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoScene {
    /// `Lamp` entity
    pub lamp:            Handle,
    /// Transform of the lamp
    pub lamp_transform:  Handle,
    /// Light of the lamp
    pub light:           Handle,
    /// `Wood` material asset
    pub wood:            Handle,
    /// `Crate` entity
    pub crate_entity:    Handle,
    /// Transform of the crate
    pub crate_transform: Handle,
    /// Renderer of the crate
    pub renderer:        Handle,
}

/// Scene objects by handle; entities list their components in attachment order
#[derive(Debug)]
pub struct SceneHost {
    objects:     BTreeMap<Handle, Box<dyn Reflect>>,
    attachments: BTreeMap<Handle, Vec<Handle>>,
    next_id:     i64,
    pending:     Vec<CompletionSignal>,
}

impl Default for SceneHost {
    fn default() -> Self { Self::new() }
}

impl SceneHost {
    /// Empty scene
    pub const fn new() -> Self {
        Self {
            objects:     BTreeMap::new(),
            attachments: BTreeMap::new(),
            next_id:     1,
            pending:     Vec::new(),
        }
    }

    /// A lamp and a wooden crate
    pub fn demo() -> (Self, DemoScene) {
        let mut host = Self::new();
        let lamp = host.spawn("Lamp");
        let lamp_transform = host.attach(lamp, |id| Transform {
            id,
            position: Vec3::new(0.0, 3.0, 0.0),
            scale: Vec3::ONE,
            ..Transform::default()
        });
        let light = host.attach(lamp, |id| Light {
            id,
            kind: LightKind::Spot,
            intensity: 2.5,
            enabled: true,
            ..Light::default()
        });
        let wood = host.insert(|id| Material {
            id,
            name: "Wood".to_string(),
            color: Color {
                r: 0.55,
                g: 0.35,
                b: 0.2,
                a: 1.0,
            },
            keywords: vec!["rough".to_string()],
        });
        let crate_entity = host.spawn("Crate");
        let crate_transform = host.attach(crate_entity, |id| Transform {
            id,
            position: Vec3::new(4.0, 0.0, 2.0),
            scale: Vec3::ONE,
            ..Transform::default()
        });
        let material = host.get::<Material>(wood).cloned().unwrap_or_default();
        let renderer = host.attach(crate_entity, |id| MeshRenderer {
            id,
            mesh: "cube".to_string(),
            material,
            cast_shadows: true,
        });

        let scene = DemoScene {
            lamp,
            lamp_transform,
            light,
            wood,
            crate_entity,
            crate_transform,
            renderer,
        };
        (host, scene)
    }

    /// Typed access to a live object
    pub fn get<T: Reflect>(&self, handle: Handle) -> Option<&T> {
        self.objects.get(&handle).and_then(|object| object.downcast_ref::<T>())
    }

    /// Number of live objects
    pub fn len(&self) -> usize { self.objects.len() }

    /// True when the scene holds nothing
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }

    const fn allocate(&mut self) -> Handle {
        let handle = Handle::new(self.next_id);
        self.next_id += 1;
        handle
    }

    fn insert<T: Reflect>(&mut self, build: impl FnOnce(Handle) -> T) -> Handle {
        let handle = self.allocate();
        self.objects.insert(handle, Box::new(build(handle)));
        handle
    }

    /// New active entity without components
    pub fn spawn(&mut self, name: &str) -> Handle {
        let entity = self.insert(|id| GameObject {
            id,
            name: name.to_string(),
            is_active: true,
        });
        self.attachments.insert(entity, Vec::new());
        entity
    }

    /// New component attached to `entity`
    pub fn attach<T: Reflect>(&mut self, entity: Handle, build: impl FnOnce(Handle) -> T) -> Handle {
        let component = self.insert(build);
        self.attachments.entry(entity).or_default().push(component);
        component
    }

    /// Renderers embed a copy of their material; keep the copies in step with the asset
    fn refresh_material_copies(&mut self, material: &Material) {
        for object in self.objects.values_mut() {
            if let Some(renderer) = object.downcast_mut::<MeshRenderer>()
                && renderer.material.id == material.id
            {
                renderer.material = material.clone();
            }
        }
    }
}

impl Host for SceneHost {
    fn resolve(&self, handle: Handle) -> Option<&dyn Reflect> {
        self.objects.get(&handle).map(|object| &**object)
    }

    fn apply(&mut self, handle: Handle, mut object: Box<dyn Reflect>) -> Result<(), Error> {
        let Some(current) = self.objects.get(&handle) else {
            return Err(Error::ReferenceNotFound(handle.id()));
        };
        if current.type_name() != object.type_name() {
            return Err(Error::HostOperation(format!(
                "'{handle}' is a '{}', cannot replace it with a '{}'",
                current.type_name(),
                object.type_name()
            )));
        }
        if let Some(material) = object.downcast_ref::<Material>() {
            let material = material.clone();
            self.refresh_material_copies(&material);
        }
        if let Some(renderer) = object.downcast_mut::<MeshRenderer>()
            && let Some(asset) = self.get::<Material>(renderer.material.id)
        {
            renderer.material = asset.clone();
        }
        debug!(%handle, type_name = %object.type_name(), "Applying object");
        self.objects.insert(handle, object);
        Ok(())
    }

    fn attached(&self, handle: Handle) -> Vec<Handle> {
        self.attachments.get(&handle).cloned().unwrap_or_default()
    }

    fn detach(&mut self, parent: Handle, child: Handle) -> Result<(), Error> {
        let components = self
            .attachments
            .get_mut(&parent)
            .ok_or(Error::ReferenceNotFound(parent.id()))?;
        let Some(index) = components.iter().position(|c| *c == child) else {
            return Err(Error::HostOperation(format!(
                "'{child}' is not attached to '{parent}'"
            )));
        };
        components.remove(index);
        self.objects.remove(&child);
        debug!(%parent, %child, "Detached component");
        Ok(())
    }

    fn create(&mut self, type_name: &TypeName) -> Result<Handle, Error> {
        let handle = match type_name.short_name().as_str() {
            "GameObject" => self.spawn("GameObject"),
            "Transform" => self.insert(|id| Transform {
                id,
                scale: Vec3::ONE,
                ..Transform::default()
            }),
            "Light" => self.insert(|id| Light {
                id,
                intensity: 1.0,
                enabled: true,
                ..Light::default()
            }),
            "Material" => self.insert(|id| Material {
                id,
                ..Material::default()
            }),
            "MeshRenderer" => self.insert(|id| MeshRenderer {
                id,
                ..MeshRenderer::default()
            }),
            _ => {
                return Err(Error::HostOperation(format!(
                    "the scene cannot create a '{type_name}'"
                )));
            },
        };
        debug!(%handle, %type_name, "Created object");
        Ok(handle)
    }

    fn hold(&mut self, signal: CompletionSignal) { self.pending.push(signal); }

    fn update(&mut self) {
        for signal in self.pending.drain(..) {
            let message = format!("Finished '{}'.", signal.description());
            signal.complete(message);
        }
    }
}
