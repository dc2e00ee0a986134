use std::{mem, sync::Arc};

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    assets::{AssetLoader, AssetSource, PendingLoad},
    camera::Camera,
    config::DemoConfig,
    controls::OrbitControls,
    explosion::{fragment_position, ExplosionPhase},
    model::Model,
    scene_graph::{
        light::{HemisphereLight, LightId},
        object3d::ObjectId,
        scene::Scene,
    },
};

pub struct DemoState {
    pub config: DemoConfig,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub scene: Scene,

    loader: AssetLoader,
    light: LightId,
    main_cube: Option<ObjectId>,
    main_cube_load: Option<PendingLoad>,
    fragments: Vec<ObjectId>,
    is_exploded: bool,
    explosion: ExplosionPhase,
    rng: StdRng,
}

impl DemoState {
    pub fn new(config: DemoConfig, source: Arc<dyn AssetSource>) -> Self {
        Self::with_rng(config, source, StdRng::from_entropy())
    }

    pub fn with_rng(config: DemoConfig, source: Arc<dyn AssetSource>, rng: StdRng) -> Self {
        let lighting = config.initial_lighting;

        let mut scene = Scene::new(lighting.background);
        let light = scene.add_light(HemisphereLight::from_config(&lighting));

        let camera = Camera::perspective(&config.camera, 1.0);
        let controls = OrbitControls::new(config.camera.target);

        Self {
            config,
            camera,
            controls,
            scene,
            loader: AssetLoader::new(source),
            light,
            main_cube: None,
            main_cube_load: None,
            fragments: Vec::new(),
            is_exploded: false,
            explosion: ExplosionPhase::Armed,
            rng,
        }
    }

    /// Fixes the camera aspect from the window size. Called once at startup.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.camera.aspect = width as f32 / height as f32;
            self.controls.set_viewport_height(height as f32);
        }
    }

    pub fn load_main_cube(&mut self) {
        log::info!("Loading main cube from {}", self.config.object_path.display());
        self.main_cube_load = Some(self.loader.load(&self.config.object_path));
    }

    pub fn load_small_cube(&self) -> PendingLoad {
        self.loader.load(&self.config.object_path)
    }

    fn attach_small_cube(&mut self, name: &str, model: Model) -> ObjectId {
        self.scene
            .spawn_model(name, model, self.config.fragment_scale)
    }

    /// Blocks until the main cube load started by `load_main_cube` has resolved.
    #[allow(dead_code)]
    pub fn wait_for_main_cube(&mut self) -> anyhow::Result<ObjectId> {
        if let Some(pending) = self.main_cube_load.take() {
            let result = pending.wait();
            self.on_main_cube_loaded(result);
        }

        self.main_cube
            .ok_or_else(|| anyhow::anyhow!("Main cube is not in the scene"))
    }

    /// Starts the one-shot explosion. Every call after the first is a no-op.
    pub fn explode(&mut self) {
        if self.is_exploded {
            return;
        }

        self.is_exploded = true;
        log::info!("Exploding into {} fragments", self.config.fragment_count);

        if let Some(main_cube) = self.main_cube.take() {
            self.scene.remove(main_cube);
        }

        self.start_fragment(0);
    }

    /// Blocks until the explosion sequence is no longer waiting on a load.
    #[allow(dead_code)]
    pub fn wait_for_explosion(&mut self) {
        loop {
            match mem::replace(&mut self.explosion, ExplosionPhase::Armed) {
                ExplosionPhase::Loading { index, pending } => {
                    let result = pending.wait();
                    self.on_fragment_loaded(index, result);
                }
                settled => {
                    self.explosion = settled;
                    return;
                }
            }
        }
    }

    /// Per-frame tick: settle finished loads, then spin whatever is on screen.
    pub fn update(&mut self) {
        self.poll_main_cube();
        self.poll_explosion();

        if !self.is_exploded {
            if let Some(object) = self.main_cube.and_then(|id| self.scene.get_object_mut(id)) {
                object.transform.rotate(self.config.rotation_speed);
            }
        }

        for &fragment in &self.fragments {
            if let Some(object) = self.scene.get_object_mut(fragment) {
                object.transform.rotate(self.config.fragment_rotation_speed);
            }
        }

        self.controls.update(&mut self.camera);
    }

    #[allow(dead_code)]
    pub fn main_cube(&self) -> Option<ObjectId> {
        self.main_cube
    }

    #[allow(dead_code)]
    pub fn fragments(&self) -> &[ObjectId] {
        &self.fragments
    }

    #[allow(dead_code)]
    pub fn is_exploded(&self) -> bool {
        self.is_exploded
    }

    #[allow(dead_code)]
    pub fn explosion_phase(&self) -> &ExplosionPhase {
        &self.explosion
    }

    #[allow(dead_code)]
    pub fn light(&self) -> &HemisphereLight {
        &self.scene.lights[self.light]
    }

    fn poll_main_cube(&mut self) {
        let Some(pending) = self.main_cube_load.as_mut() else {
            return;
        };
        let Some(result) = pending.try_take() else {
            return;
        };

        self.main_cube_load = None;
        self.on_main_cube_loaded(result);
    }

    fn on_main_cube_loaded(&mut self, result: anyhow::Result<Model>) {
        match result {
            Ok(_) if self.is_exploded => {
                log::debug!("Main cube finished loading after the explosion, discarding it");
            }
            Ok(model) => {
                let id = self.scene.spawn_model("Main cube", model, self.config.main_scale);
                self.main_cube = Some(id);
                log::info!("Main cube loaded");
            }
            Err(e) => {
                log::warn!("Failed to load main cube: {:#}", e);
            }
        }
    }

    fn poll_explosion(&mut self) {
        let ExplosionPhase::Loading { index, pending } = &mut self.explosion else {
            return;
        };
        let index = *index;
        let Some(result) = pending.try_take() else {
            return;
        };

        self.on_fragment_loaded(index, result);
    }

    fn start_fragment(&mut self, index: usize) {
        self.explosion = if index < self.config.fragment_count {
            ExplosionPhase::Loading {
                index,
                pending: self.load_small_cube(),
            }
        } else {
            self.swap_lighting();
            log::info!("Explosion complete");
            ExplosionPhase::Complete
        };
    }

    fn on_fragment_loaded(&mut self, index: usize, result: anyhow::Result<Model>) {
        let model = match result {
            Ok(model) => model,
            Err(e) => {
                log::error!("Failed to load fragment {}: {:#}", index, e);
                self.explosion = ExplosionPhase::Aborted { index };
                return;
            }
        };

        let id = self.attach_small_cube(&format!("Fragment {}", index), model);

        let position = fragment_position(
            index,
            self.config.fragment_size(),
            self.config.spread_distance,
            &mut self.rng,
        );
        if let Some(object) = self.scene.get_object_mut(id) {
            object.transform.set_translation(position);
        }

        self.fragments.push(id);
        self.start_fragment(index + 1);
    }

    fn swap_lighting(&mut self) {
        let lighting = self.config.exploded_lighting;

        self.scene.remove_light(self.light);
        self.scene.set_background(lighting.background);
        self.light = self.scene.add_light(HemisphereLight::from_config(&lighting));
    }

    #[cfg(test)]
    fn snapshot(&self) -> Vec<(glam::Vec3, glam::Vec3, f32)> {
        self.scene
            .children()
            .map(|(_, object)| {
                (
                    object.transform.translation(),
                    object.transform.rotation(),
                    object.transform.scale(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::assets::testing::ScriptedSource;
    use crate::scene_graph::color::Color;

    fn demo(source: Arc<ScriptedSource>) -> DemoState {
        DemoState::with_rng(DemoConfig::default(), source, StdRng::seed_from_u64(42))
    }

    fn loaded_demo(source: Arc<ScriptedSource>) -> DemoState {
        let mut demo = demo(source);
        demo.load_main_cube();
        demo.wait_for_main_cube().unwrap();
        demo
    }

    #[test]
    fn fresh_scene_shows_scaled_main_cube() {
        let demo = loaded_demo(ScriptedSource::succeeding());

        let main = demo.main_cube().unwrap();
        assert!(demo.scene.contains(main));
        assert_eq!(demo.scene.get_object(main).unwrap().transform.scale(), 7.0);
        assert_eq!(demo.scene.background(), Color::WHITE);

        let lights = demo.scene.attached_lights().collect::<Vec<_>>();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].sky_color, Color::from_rgb8(150, 150, 150));
        assert_eq!(lights[0].ground_color, Color::BLACK);
        assert_eq!(lights[0].intensity, 1.0);
    }

    #[test]
    fn main_cube_uses_configured_path() {
        let source = ScriptedSource::succeeding();
        loaded_demo(source.clone());

        let paths = source.requested_paths.lock().unwrap();
        assert_eq!(paths.as_slice(), [DemoConfig::default().object_path]);
    }

    #[test]
    fn failed_main_cube_leaves_scene_empty() {
        let mut demo = demo(ScriptedSource::failing_at(&[0]));
        demo.load_main_cube();

        assert!(demo.wait_for_main_cube().is_err());
        assert_eq!(demo.scene.children().count(), 0);
    }

    #[test]
    fn explosion_replaces_main_cube_with_fragments() {
        let source = ScriptedSource::succeeding();
        let mut demo = loaded_demo(source.clone());
        let main = demo.main_cube().unwrap();

        demo.explode();
        demo.wait_for_explosion();

        assert!(demo.is_exploded());
        assert!(!demo.scene.contains(main));
        assert!(demo.main_cube().is_none());
        assert!(matches!(demo.explosion_phase(), ExplosionPhase::Complete));
        assert_eq!(demo.fragments().len(), 8);
        assert_eq!(source.call_count(), 9);

        for &fragment in demo.fragments() {
            assert!(demo.scene.contains(fragment));
            assert_eq!(demo.scene.get_object(fragment).unwrap().transform.scale(), 2.0);
        }

        assert_eq!(demo.scene.background(), Color::BLACK);
        let lights = demo.scene.attached_lights().collect::<Vec<_>>();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].sky_color, Color::WHITE);
        assert_eq!(lights[0].ground_color, Color::BLACK);
        assert_eq!(demo.light().sky_color, Color::WHITE);
    }

    #[test]
    fn fragments_are_ordered_by_load_initiation() {
        let mut demo = loaded_demo(ScriptedSource::succeeding());
        demo.explode();
        demo.wait_for_explosion();

        let size = demo.config.fragment_size();
        let spread = demo.config.spread_distance;

        for (index, &fragment) in demo.fragments().iter().enumerate() {
            let object = demo.scene.get_object(fragment).unwrap();
            assert_eq!(object.name, format!("Fragment {index}"));

            let position = object.transform.translation();
            let signs = [index % 2, (index / 2) % 2, (index / 4) % 2]
                .map(|bit| if bit == 0 { 1.0 } else { -1.0 });

            for (axis, coordinate) in position.to_array().into_iter().enumerate() {
                assert_eq!(coordinate.signum(), signs[axis]);
                assert!(coordinate.abs() >= size && coordinate.abs() < size + spread);
            }
        }

        // The scripted source numbers models by call, so load order is visible too.
        let model_names = demo
            .fragments()
            .iter()
            .map(|&id| {
                let model_id = demo.scene.get_object(id).unwrap().model_id.unwrap();
                demo.scene.models[model_id].model.name.clone()
            })
            .collect::<Vec<_>>();
        let expected = (1..=8).map(|call| format!("Load #{call}")).collect::<Vec<_>>();
        assert_eq!(model_names, expected);
    }

    #[test]
    fn failed_fragment_aborts_the_sequence() {
        // Call 0 is the main cube, so call 4 is fragment 3.
        let source = ScriptedSource::failing_at(&[4]);
        let mut demo = loaded_demo(source.clone());
        let main = demo.main_cube().unwrap();

        demo.explode();
        demo.wait_for_explosion();

        assert!(demo.is_exploded());
        assert!(matches!(demo.explosion_phase(), ExplosionPhase::Aborted { index: 3 }));
        assert_eq!(demo.fragments().len(), 3);
        assert_eq!(source.call_count(), 5);
        assert!(!demo.scene.contains(main));
        assert!(demo.fragments().iter().all(|&id| demo.scene.contains(id)));
        assert_eq!(demo.scene.children().count(), 3);

        assert_eq!(demo.scene.background(), Color::WHITE);
        assert_eq!(demo.light().sky_color, Color::from_rgb8(150, 150, 150));

        demo.explode();
        demo.wait_for_explosion();
        assert_eq!(demo.fragments().len(), 3);
        assert_eq!(source.call_count(), 5);
    }

    #[test]
    fn second_explosion_is_a_no_op() {
        let source = ScriptedSource::succeeding();
        let mut demo = loaded_demo(source.clone());

        demo.explode();
        demo.wait_for_explosion();
        let fragments = demo.fragments().to_vec();
        let snapshot = demo.snapshot();
        let light = *demo.light();
        let background = demo.scene.background();

        demo.explode();
        demo.wait_for_explosion();

        assert_eq!(demo.fragments(), fragments.as_slice());
        assert_eq!(demo.snapshot(), snapshot);
        assert_eq!(*demo.light(), light);
        assert_eq!(demo.scene.background(), background);
        assert_eq!(demo.scene.attached_lights().count(), 1);
        assert_eq!(source.call_count(), 9);
    }

    #[test]
    fn explosion_is_armed_until_clicked() {
        let mut demo = loaded_demo(ScriptedSource::succeeding());
        demo.update();

        assert!(!demo.is_exploded());
        assert!(matches!(demo.explosion_phase(), ExplosionPhase::Armed));
        assert!(demo.fragments().is_empty());
    }

    #[test]
    fn rotation_moves_from_main_cube_to_fragments() {
        let mut demo = loaded_demo(ScriptedSource::succeeding());
        let main = demo.main_cube().unwrap();

        demo.update();
        demo.update();
        let main_rotation = demo.scene.get_object(main).unwrap().transform.rotation();
        assert!((main_rotation - Vec3::new(0.02, 0.01, 0.02)).length() < 1e-6);

        demo.explode();
        demo.wait_for_explosion();
        demo.update();

        assert_eq!(
            demo.scene.get_object(main).unwrap().transform.rotation(),
            main_rotation
        );
        for &fragment in demo.fragments() {
            let rotation = demo.scene.get_object(fragment).unwrap().transform.rotation();
            assert!((rotation - Vec3::new(0.005, 0.0025, 0.005)).length() < 1e-6);
        }
    }

    #[test]
    fn frame_loop_drives_the_explosion_without_blocking() {
        let mut demo = loaded_demo(ScriptedSource::succeeding());
        demo.explode();

        let mut frames = 0;
        while !matches!(demo.explosion_phase(), ExplosionPhase::Complete) {
            demo.update();
            frames += 1;
            assert!(frames < 100_000, "explosion never completed");
            std::thread::yield_now();
        }

        assert_eq!(demo.fragments().len(), 8);
        assert_eq!(demo.scene.background(), Color::BLACK);
    }

    #[test]
    fn main_cube_arriving_after_explosion_is_discarded() {
        let mut demo = demo(ScriptedSource::succeeding());
        demo.load_main_cube();
        demo.explode();
        demo.wait_for_explosion();

        assert!(demo.wait_for_main_cube().is_err());
        assert_eq!(demo.scene.children().count(), 8);
    }
}
