use recipe_core::{MaterialAppearance, MaterialKind};

/// Fixed render appearance for a material class.
pub fn appearance(kind: MaterialKind) -> MaterialAppearance {
    let color = match kind {
        MaterialKind::Metal => 0x888888,
        MaterialKind::Plastic => 0x0ea5e9,
        MaterialKind::Glass => 0xffffff,
        MaterialKind::Rubber => 0x1a1a1a,
        MaterialKind::Wood => 0x8b4513,
    };
    let (metalness, roughness) = match kind {
        MaterialKind::Metal => (0.8, 0.2),
        _ => (0.2, 0.6),
    };

    MaterialAppearance {
        kind,
        color,
        metalness,
        roughness,
    }
}

#[cfg(test)]
mod tests {
    use recipe_core::MaterialKind;

    use super::appearance;

    #[test]
    fn metal_is_shiny_and_grey() {
        let metal = appearance(MaterialKind::Metal);
        assert_eq!(metal.color, 0x888888);
        assert_eq!((metal.metalness, metal.roughness), (0.8, 0.2));
    }

    #[test]
    fn unrecognized_tags_render_as_plastic() {
        let plastic = appearance(MaterialKind::classify(Some("carbon fibre")));
        assert_eq!(plastic.kind, MaterialKind::Plastic);
        assert_eq!(plastic.color, 0x0ea5e9);
        assert_eq!((plastic.metalness, plastic.roughness), (0.2, 0.6));
    }

    #[test]
    fn every_class_has_a_distinct_color() {
        let colors = [
            MaterialKind::Metal,
            MaterialKind::Plastic,
            MaterialKind::Glass,
            MaterialKind::Rubber,
            MaterialKind::Wood,
        ]
        .map(|kind| appearance(kind).color);
        for (index, color) in colors.iter().enumerate() {
            assert!(!colors[index + 1..].contains(color));
        }
    }
}
