use windfield::WindFieldConfig;

/// Settings that can go to the running volume without reallocating it.
/// The draft resolution is held back until it is applied explicitly.
pub fn live_config(draft: &WindFieldConfig, running: &WindFieldConfig) -> WindFieldConfig {
    let mut live = draft.clone();
    live.volume.resolution = running.volume.resolution;
    live
}
