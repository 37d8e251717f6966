use glam::{Vec2, Vec3};
use meshedit::highlight::DrawBatch;
use meshedit::host::ViewCamera;
use meshedit::{
    CastOptions, EngineSettings, MemoryScene, Registry, SessionController, ToolStatus,
    TrackOptions,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshedit=info,meshedit_demo=info".into()),
        )
        .init();

    // Parse --scene <path> argument
    let scene_file = parse_scene_arg().unwrap_or_else(meshedit::fixtures::two_cube_scene);
    let Some(first) = scene_file.objects.first() else {
        tracing::error!("Scene has no objects");
        return;
    };
    let p = first.transform.position;
    let target = Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32);

    let mut scene = MemoryScene::from_scene_file(scene_file.clone());
    scene.camera = ViewCamera::front(target, 8.0);
    // Slightly off the face center so the pick lands inside one fan triangle
    let pointer = scene.camera.size * 0.5 + Vec2::new(7.0, -5.0);

    let settings = EngineSettings::load();
    let mut registry = Registry::new();
    run_session(&mut scene, &mut registry, settings, &scene_file, pointer);

    for note in registry.drain_notifications() {
        tracing::info!("Notification ({:?}): {}", note.level, note.message);
    }
    for obj in &scene.to_scene_file().objects {
        tracing::info!(
            "`{}`: {} vertices, {} faces",
            obj.name,
            obj.mesh.vertex_count(),
            obj.mesh.face_count()
        );
    }
}

fn run_session(
    scene: &mut MemoryScene,
    registry: &mut Registry,
    settings: EngineSettings,
    scene_file: &shared::SceneFile,
    pointer: Vec2,
) {
    let mut ctl = SessionController::new(scene, registry, settings);
    for obj in &scene_file.objects {
        ctl.add_object(&obj.id, TrackOptions::pickable());
    }
    if let Err(e) = ctl.ensure_ready(true, true) {
        tracing::error!("{e}");
        ctl.apply_status(ToolStatus::Cancel);
        return;
    }
    let cast_options = CastOptions::CHECK_OBSTRUCTIONS;

    // Frame 1: dissolve the edge under the pointer
    ctl.begin_frame();
    match ctl.cast_to_edge(pointer, cast_options) {
        Some(hit) => {
            tracing::info!("Edge {} of `{}` under pointer at {:?}", hit.index, hit.object, hit.point);
            ctl.highlight_hit(&hit);
            let dissolved = ctl
                .session_mut(&hit.object)
                .map(|s| s.topology_mut().dissolve_edge(hit.index));
            match dissolved {
                Some(Ok(face)) => {
                    tracing::info!("Dissolved into face {face}");
                    if ctl.stage_commit(&hit.object, true) {
                        ctl.push_commits();
                    }
                }
                Some(Err(e)) => tracing::warn!("Cannot dissolve edge {}: {e}", hit.index),
                None => {}
            }
        }
        None => tracing::info!("No edge under pointer"),
    }
    let mut drawn: Vec<DrawBatch> = Vec::new();
    ctl.draw(&mut drawn);
    tracing::info!("Drew {} highlight batch(es)", drawn.len());
    ctl.end_frame();

    // Frame 2: pull the vertex under the pointer towards the viewer
    ctl.begin_frame();
    if let Some(hit) = ctl.cast_to_vertex(pointer, cast_options) {
        let moved = ctl
            .session_mut(&hit.object)
            .is_some_and(|s| s.topology_mut().translate_vertex(hit.index, Vec3::Z * 0.25).is_ok());
        if moved && ctl.stage_commit(&hit.object, true) {
            ctl.push_commits();
            tracing::info!("Moved vertex {} of `{}`", hit.index, hit.object);
        }
    }
    ctl.end_frame();

    tracing::info!("Undo steps available: {}", ctl.undo_len());
    if ctl.undo_commits(true) {
        tracing::info!("Undid last step; redo available: {}", ctl.can_redo());
    }

    ctl.apply_status(ToolStatus::Confirm);
}

fn parse_scene_arg() -> Option<shared::SceneFile> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--scene" && i + 1 < args.len() {
            let path = &args[i + 1];
            match std::fs::read_to_string(path) {
                Ok(json) => match MemoryScene::from_json(&json) {
                    Ok(scene) => {
                        let scene = scene.to_scene_file();
                        tracing::info!("Loaded scene from {path} ({} objects)", scene.objects.len());
                        return Some(scene);
                    }
                    Err(e) => {
                        tracing::error!("Failed to load scene from {path}: {e}");
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read scene file {path}: {e}");
                }
            }
            break;
        }
        i += 1;
    }
    None
}
