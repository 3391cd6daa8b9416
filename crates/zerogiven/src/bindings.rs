use catalog::{AssetDescriptor, Catalog, QualityTier};
use renderer::{RenderPresetId, ShowcaseAsset};
use scheduler::{CycleSettings, PreloadSettings};

pub fn preset_for_tier(tier: QualityTier) -> RenderPresetId {
    match tier {
        QualityTier::Low => RenderPresetId::Low,
        QualityTier::Balanced => RenderPresetId::Balanced,
        QualityTier::High => RenderPresetId::High,
    }
}

pub fn showcase_asset(descriptor: &AssetDescriptor) -> ShowcaseAsset {
    ShowcaseAsset {
        id: descriptor.id.clone(),
        label: descriptor.label.clone(),
        url: descriptor.url.clone(),
    }
}

pub fn showcase_assets(catalog: &Catalog) -> Vec<ShowcaseAsset> {
    catalog.assets.iter().map(showcase_asset).collect()
}

pub fn cycle_settings(catalog: &Catalog) -> CycleSettings {
    CycleSettings {
        auto_cycle: catalog.cycle.enabled,
        interval: catalog.cycle.interval,
        transition: catalog.cycle.transition,
    }
}

pub fn preload_settings(catalog: &Catalog) -> PreloadSettings {
    PreloadSettings {
        delay: catalog.preload.delay,
        stagger: catalog.preload.stagger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tiers_map_onto_presets() {
        assert_eq!(preset_for_tier(QualityTier::Low), RenderPresetId::Low);
        assert_eq!(preset_for_tier(QualityTier::Balanced), RenderPresetId::Balanced);
        assert_eq!(preset_for_tier(QualityTier::High), RenderPresetId::High);
    }

    #[test]
    fn catalog_timings_carry_over() {
        let catalog = Catalog::from_toml_str(
            r#"
version = 1

[cycle]
enabled = false
interval = "5s"
transition = "300ms"

[preload]
delay = "2s"
stagger = "250ms"

[[assets]]
id = "a"
label = "Model A"
url = "models/a.glb"
"#,
        )
        .unwrap();

        let cycle = cycle_settings(&catalog);
        assert!(!cycle.auto_cycle);
        assert_eq!(cycle.interval, Duration::from_secs(5));
        assert_eq!(cycle.transition, Duration::from_millis(300));

        let preload = preload_settings(&catalog);
        assert_eq!(preload.delay, Duration::from_secs(2));
        assert_eq!(preload.stagger, Duration::from_millis(250));

        let assets = showcase_assets(&catalog);
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].label, "Model A");
        assert_eq!(assets[0].url, "models/a.glb");
    }
}
