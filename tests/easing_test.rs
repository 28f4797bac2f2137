use approx::assert_relative_eq;
use stage_ngin::{
    error::EngineError,
    scroll::{Anchor, Easing, RegionBounds, ScrollTrigger, Threshold},
};

#[test]
fn should_parse_site_easing_names() {
    let parsed = [
        ("none", Easing::Linear),
        ("power1.out", Easing::PowerOut(1)),
        ("power2", Easing::PowerOut(2)),
        ("power3.inOut", Easing::PowerInOut(3)),
        ("cubic.in", Easing::PowerIn(2)),
        ("sine.inOut", Easing::SineInOut),
        ("back.out(1.7)", Easing::BackOut(1.7)),
        (
            "elastic.out(1, 0.3)",
            Easing::ElasticOut {
                amplitude: 1.0,
                period: 0.3,
            },
        ),
    ];

    for (name, easing) in parsed {
        assert_eq!(name.parse::<Easing>().unwrap(), easing, "{name}");
    }
    assert_eq!(Easing::default(), Easing::PowerOut(1));
}

#[test]
fn should_reject_unknown_easings() {
    for name in [
        "wobble.out",
        "power2.sideways",
        "back.out(x)",
        "back.out(1.7",
        "powerX.in",
        "elastic.out(1, 0)",
        "elastic.out(1, -0.3)",
    ] {
        assert!(
            matches!(name.parse::<Easing>(), Err(EngineError::InvalidEasing(_))),
            "{name}"
        );
    }
}

#[test]
fn should_stay_finite_with_a_degenerate_elastic_period() {
    let easing = Easing::ElasticOut {
        amplitude: 1.0,
        period: 0.0,
    };

    for t in [0.0, 0.25, 0.5, 1.0] {
        assert!(easing.apply(t).is_finite(), "{t}");
    }
}

#[test]
fn should_pin_curve_endpoints() {
    let curves = [
        Easing::Linear,
        Easing::PowerIn(2),
        Easing::PowerOut(2),
        Easing::PowerInOut(1),
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
        Easing::BackOut(1.7),
        Easing::ElasticOut {
            amplitude: 1.0,
            period: 0.3,
        },
    ];

    for easing in curves {
        assert_relative_eq!(easing.apply(0.0), 0.0, epsilon = 1e-5);
        assert_relative_eq!(easing.apply(1.0), 1.0, epsilon = 1e-5);
        // inputs outside [0, 1] clamp
        assert_relative_eq!(easing.apply(-3.0), 0.0, epsilon = 1e-5);
        assert_relative_eq!(easing.apply(4.0), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn should_overshoot_with_back_out() {
    let back = Easing::BackOut(1.7);
    assert!((0..100).map(|i| back.apply(i as f32 / 100.0)).any(|v| v > 1.0));
    assert_relative_eq!(Easing::PowerOut(1).apply(0.5), 0.75);
    assert_relative_eq!(Easing::SineInOut.apply(0.5), 0.5, epsilon = 1e-6);
}

#[test]
fn should_parse_thresholds() {
    assert_eq!("top 80%".parse::<Threshold>().unwrap(), Threshold::TOP_80);
    assert_eq!(
        "center 100px".parse::<Threshold>().unwrap(),
        Threshold {
            element: Anchor::Fraction(0.5),
            viewport: Anchor::Pixels(100.0),
        }
    );
    // a single keyword applies to both edges
    assert_eq!(
        "bottom".parse::<Threshold>().unwrap(),
        Threshold {
            element: Anchor::Fraction(1.0),
            viewport: Anchor::Fraction(1.0),
        }
    );
    assert_eq!("bottom top".parse::<Threshold>().unwrap().to_string(), "bottom top");

    for bad in ["", "middle 80%", "top 80% 10px", "top eighty%"] {
        assert!(
            matches!(bad.parse::<Threshold>(), Err(EngineError::InvalidThreshold(_))),
            "{bad:?}"
        );
    }
    assert!(ScrollTrigger::at("top 80%").unwrap().until("nowhere").is_err());
}

#[test]
fn should_resolve_thresholds_to_scroll_offsets() {
    let bounds = RegionBounds {
        top: 1000.0,
        height: 500.0,
    };

    let at = |s: &str| s.parse::<Threshold>().unwrap().resolve(bounds, 1000.0);

    assert_relative_eq!(at("top 70%"), 300.0, epsilon = 1e-3);
    assert_relative_eq!(at("top bottom"), 0.0, epsilon = 1e-3);
    assert_relative_eq!(at("bottom top"), 1500.0, epsilon = 1e-3);
    assert_relative_eq!(at("center center"), 750.0, epsilon = 1e-3);
    assert_relative_eq!(at("top 100px"), 900.0, epsilon = 1e-3);
}

#[test]
fn should_default_scrubbed_end_to_bottom_edge() {
    let trigger = ScrollTrigger::at("top 80%").unwrap();
    assert!(trigger.end_or_default().is_none());

    let end = trigger.scrubbed().end_or_default().unwrap();
    assert_eq!(end.element, Anchor::Fraction(1.0));
    assert_eq!(end.viewport, Anchor::Fraction(0.8));
}
