use stardrift::config::SceneConfig;
use stardrift::device::DeviceProfile;
use stardrift::error::SceneError;
use stardrift::viewer;

fn main() -> Result<(), SceneError> {
    env_logger::init();

    let profile = DeviceProfile::detect();
    log::info!("device tier: {:?}", profile.tier);

    viewer::run(profile, SceneConfig::default())
}
