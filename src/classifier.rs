use rayon::prelude::*;

use crate::config::Configuration;
use crate::devices::{DeviceRegistry, MOBILE};
use crate::error::Result;
use crate::resolver::FormatResolver;
use crate::types::{Classification, RequestSignals, SessionOverride};

/// The rule that settled a classification, in the order rules are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Session override `ignore_mobile`; nothing else is looked at.
    IgnoredBySession,
    /// XHR request while `skip_xhr_requests` is on.
    SkippedXhr,
    /// `skip_mobile=true` request parameter.
    SkippedByParam,
    /// None of session force, mobile user agent or mobile format applied.
    NoMobileSignal,
    /// Mobile, but the user agent matches a `skip_user_agents` device.
    ExcludedUserAgent,
    Mobile,
}

impl Decision {
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Mobile)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IgnoredBySession => "ignored by session",
            Self::SkippedXhr => "xhr request skipped",
            Self::SkippedByParam => "skipped by parameter",
            Self::NoMobileSignal => "no mobile signal",
            Self::ExcludedUserAgent => "user agent excluded",
            Self::Mobile => "mobile",
        }
    }
}

/// Decides whether a request is answered with a mobile format, and which.
///
/// Holds only shared references to setup-time state, so one classifier can
/// serve any number of requests concurrently.
#[derive(Debug, Clone, Copy)]
pub struct MobileClassifier<'a> {
    config: &'a Configuration,
    registry: &'a DeviceRegistry,
}

impl<'a> MobileClassifier<'a> {
    pub fn new(config: &'a Configuration, registry: &'a DeviceRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &'a Configuration {
        self.config
    }

    pub fn registry(&self) -> &'a DeviceRegistry {
        self.registry
    }

    /// Classify one request.
    ///
    /// Fails when a device referenced by `skip_user_agents` or by a chain key
    /// is not registered, or when its pattern cannot be matched.
    pub fn classify(&self, signals: &RequestSignals) -> Result<Classification> {
        let decision = self.decide(signals)?;
        if !decision.is_mobile() {
            tracing::debug!(
                user_agent = %signals.user_agent,
                decision = decision.as_str(),
                "standard request"
            );
            return Ok(Classification::Standard);
        }
        let format = self.select_format(signals)?;
        tracing::debug!(user_agent = %signals.user_agent, format = %format, "mobile request");
        Ok(Classification::Mobile { format })
    }

    /// Classify every request in `batch` in parallel. Results are in input
    /// order.
    pub fn classify_all(&self, batch: &[RequestSignals]) -> Vec<Result<Classification>> {
        batch.par_iter().map(|s| self.classify(s)).collect()
    }

    /// Classify and, for a mobile request, rewrite its negotiated format:
    /// the chosen tag becomes the format, and the candidate list becomes the
    /// tag's fallback chain (or just the tag when it has none).
    pub fn handle_mobile(&self, signals: &mut RequestSignals) -> Result<Classification> {
        let classification = self.classify(signals)?;
        if let Classification::Mobile { format } = &classification {
            let resolver = FormatResolver::new(self.config);
            signals.negotiated.formats = if resolver.has_chain(format) {
                resolver.chain_for(format)
            } else {
                vec![format.clone()]
            };
            signals.negotiated.format = format.clone();
        }
        Ok(classification)
    }

    /// Walk the rules top to bottom; the first one that applies wins.
    pub fn decide(&self, signals: &RequestSignals) -> Result<Decision> {
        if signals.session_override == Some(SessionOverride::IgnoreMobile) {
            return Ok(Decision::IgnoredBySession);
        }
        if self.stop_processing_because_xhr(signals) {
            return Ok(Decision::SkippedXhr);
        }
        if self.stop_processing_because_param(signals) {
            return Ok(Decision::SkippedByParam);
        }
        let wants_mobile = self.force_mobile_by_session(signals)
            || self.is_mobile_request(signals)?
            || self.is_mobile_view(signals);
        if !wants_mobile {
            return Ok(Decision::NoMobileSignal);
        }
        if self.user_agent_excluded(signals)? {
            return Ok(Decision::ExcludedUserAgent);
        }
        Ok(Decision::Mobile)
    }

    /// Whether the request should get a mobile response, leaving aside the
    /// `ignore_mobile` session override.
    pub fn respond_as_mobile(&self, signals: &RequestSignals) -> Result<bool> {
        let signals = RequestSignals {
            session_override: signals
                .session_override
                .filter(|o| *o != SessionOverride::IgnoreMobile),
            ..signals.clone()
        };
        Ok(self.decide(&signals)?.is_mobile())
    }

    pub fn stop_processing_because_xhr(&self, signals: &RequestSignals) -> bool {
        self.config.skip_xhr_requests() && signals.xhr
    }

    pub fn stop_processing_because_param(&self, signals: &RequestSignals) -> bool {
        signals.skip_requested()
    }

    pub fn force_mobile_by_session(&self, signals: &RequestSignals) -> bool {
        signals.session_override == Some(SessionOverride::ForceMobile)
    }

    /// Whether the user agent matches the broad `mobile` device.
    pub fn is_mobile_request(&self, signals: &RequestSignals) -> Result<bool> {
        self.request_device(signals, MOBILE)
    }

    /// Whether the mobile format was asked for explicitly, either as the
    /// `format` parameter or as the already negotiated format.
    pub fn is_mobile_view(&self, signals: &RequestSignals) -> bool {
        signals.format_param() == Some(MOBILE) || signals.negotiated.format == MOBILE
    }

    pub fn request_device(&self, signals: &RequestSignals, device: &str) -> Result<bool> {
        self.registry.matches(device, &signals.user_agent)
    }

    /// Whether any `skip_user_agents` device matches the user agent.
    pub fn user_agent_excluded(&self, signals: &RequestSignals) -> Result<bool> {
        for device in self.config.skip_user_agents() {
            if self.request_device(signals, device)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// First chain key, in declared order, whose device matches the user
    /// agent; `mobile` when none does.
    pub fn select_format(&self, signals: &RequestSignals) -> Result<String> {
        for device in self.config.fallback_chains().keys() {
            if self.request_device(signals, device)? {
                return Ok(device.clone());
            }
        }
        Ok(MOBILE.to_string())
    }
}

/// Classify `signals` with a throwaway [`MobileClassifier`].
pub fn classify(
    signals: &RequestSignals,
    config: &Configuration,
    registry: &DeviceRegistry,
) -> Result<Classification> {
    MobileClassifier::new(config, registry).classify(signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mobile_agents::MOBILE_USER_AGENTS;
    use crate::types::{FORMAT_PARAM, SKIP_MOBILE_PARAM};

    const DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                           (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const ANDROID_PHONE: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
                                 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                          AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";

    fn setup(builder: crate::config::ConfigBuilder) -> (Configuration, DeviceRegistry) {
        let mut registry = DeviceRegistry::new();
        let config = builder.build(&mut registry);
        (config, registry)
    }

    fn defaults() -> (Configuration, DeviceRegistry) {
        (Configuration::default(), DeviceRegistry::new())
    }

    #[test]
    fn normal_request_is_not_mobile() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        assert!(!c.is_mobile_request(&RequestSignals::new("some mozilla")).unwrap());
        assert!(!c.is_mobile_request(&RequestSignals::new(DESKTOP)).unwrap());
    }

    #[test]
    fn every_mobile_agent_is_mobile() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        for agent in MOBILE_USER_AGENTS {
            assert!(c.is_mobile_request(&RequestSignals::new(*agent)).unwrap(), "{}", agent);
        }
    }

    #[test]
    fn mobile_view_from_param() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        assert!(c.is_mobile_view(&RequestSignals::new(DESKTOP).with_param(FORMAT_PARAM, "mobile")));
        assert!(!c.is_mobile_view(&RequestSignals::new(DESKTOP).with_param(FORMAT_PARAM, "html")));
    }

    #[test]
    fn mobile_view_from_negotiated_format() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        let signals = RequestSignals::new(DESKTOP).with_param(FORMAT_PARAM, "html");
        assert!(c.is_mobile_view(&signals.clone().with_format("mobile")));
        assert!(!c.is_mobile_view(&signals.with_format("html")));
    }

    #[test]
    fn xhr_stop_depends_on_option() {
        for (skip, xhr, expected) in [
            (false, true, false),
            (true, true, true),
            (false, false, false),
            (true, false, false),
        ] {
            let (config, registry) = setup(Configuration::builder().skip_xhr_requests(skip));
            let c = MobileClassifier::new(&config, &registry);
            let signals = RequestSignals::new(IPHONE).with_xhr(xhr);
            assert_eq!(c.stop_processing_because_xhr(&signals), expected);
        }
    }

    #[test]
    fn param_stop() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        assert!(c.stop_processing_because_param(
            &RequestSignals::new(IPHONE).with_param(SKIP_MOBILE_PARAM, "true")
        ));
        assert!(!c.stop_processing_because_param(&RequestSignals::new(IPHONE)));
    }

    #[test]
    fn force_mobile_by_session() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        let forced = RequestSignals::new(DESKTOP)
            .with_session_override(Some(SessionOverride::ForceMobile));
        assert!(c.force_mobile_by_session(&forced));
        assert!(!c.force_mobile_by_session(&RequestSignals::new(DESKTOP)));
    }

    #[test]
    fn impediments_beat_every_positive_signal() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        let all_positive = RequestSignals::new(IPHONE)
            .with_session_override(Some(SessionOverride::ForceMobile))
            .with_param(FORMAT_PARAM, "mobile");
        assert!(c.respond_as_mobile(&all_positive).unwrap());

        let xhr = all_positive.clone().with_xhr(true);
        assert!(!c.respond_as_mobile(&xhr).unwrap());
        assert_eq!(c.decide(&xhr).unwrap(), Decision::SkippedXhr);

        let param = all_positive.with_param(SKIP_MOBILE_PARAM, "true");
        assert!(!c.respond_as_mobile(&param).unwrap());
        assert_eq!(c.decide(&param).unwrap(), Decision::SkippedByParam);
    }

    #[test]
    fn any_positive_signal_is_enough() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        assert!(!c.respond_as_mobile(&RequestSignals::new(DESKTOP)).unwrap());
        assert!(c
            .respond_as_mobile(
                &RequestSignals::new(DESKTOP)
                    .with_session_override(Some(SessionOverride::ForceMobile))
            )
            .unwrap());
        assert!(c.respond_as_mobile(&RequestSignals::new("android")).unwrap());
        assert!(c
            .respond_as_mobile(&RequestSignals::new(DESKTOP).with_param(FORMAT_PARAM, "mobile"))
            .unwrap());
    }

    #[test]
    fn skip_user_agents_excludes_matching_devices() {
        let signals = RequestSignals::new("ipad");
        for (skip, expected) in [
            (vec!["ipad", "android"], false),
            (vec![], true),
            (vec!["android"], true),
        ] {
            let (config, registry) = setup(Configuration::builder().skip_user_agents(skip));
            let c = MobileClassifier::new(&config, &registry);
            assert_eq!(c.respond_as_mobile(&signals).unwrap(), expected);
        }
    }

    #[test]
    fn exclusion_beats_forced_session() {
        let (config, registry) = setup(Configuration::builder().skip_user_agents(["ipad"]));
        let c = MobileClassifier::new(&config, &registry);
        let signals = RequestSignals::new("Mozilla/5.0 (iPad; CPU OS 17_0)")
            .with_session_override(Some(SessionOverride::ForceMobile));
        assert_eq!(c.decide(&signals).unwrap(), Decision::ExcludedUserAgent);
        assert_eq!(c.classify(&signals).unwrap(), Classification::Standard);
    }

    #[test]
    fn ignore_mobile_wins_over_everything() {
        let (config, registry) = setup(Configuration::builder().skip_user_agents(["not_registered"]));
        let c = MobileClassifier::new(&config, &registry);
        let signals = RequestSignals::new(IPHONE)
            .with_param(FORMAT_PARAM, "mobile")
            .with_session_override(Some(SessionOverride::IgnoreMobile));
        assert_eq!(c.decide(&signals).unwrap(), Decision::IgnoredBySession);
        assert_eq!(c.classify(&signals).unwrap(), Classification::Standard);

        let xhr = signals.clone().with_xhr(true);
        assert_eq!(c.decide(&xhr).unwrap(), Decision::IgnoredBySession);

        // respond_as_mobile looks past the override, so the unknown skip
        // device surfaces there.
        assert!(matches!(
            c.respond_as_mobile(&signals),
            Err(Error::UnknownDevice(_))
        ));
    }

    #[test]
    fn xhr_skip_beats_forced_session() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        let signals = RequestSignals::new(IPHONE)
            .with_xhr(true)
            .with_session_override(Some(SessionOverride::ForceMobile));
        assert_eq!(c.classify(&signals).unwrap(), Classification::Standard);
    }

    #[test]
    fn handle_mobile_leaves_standard_requests_alone() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        let mut ignored = RequestSignals::new(IPHONE)
            .with_session_override(Some(SessionOverride::IgnoreMobile));
        assert_eq!(c.handle_mobile(&mut ignored).unwrap(), Classification::Standard);
        assert_eq!(ignored.negotiated.format, "html");

        let mut desktop = RequestSignals::new(DESKTOP);
        assert_eq!(c.handle_mobile(&mut desktop).unwrap(), Classification::Standard);
        assert_eq!(desktop.negotiated.formats, vec!["html"]);
    }

    #[test]
    fn handle_mobile_sets_mobile_format() {
        let (config, registry) = defaults();
        let c = MobileClassifier::new(&config, &registry);
        let mut signals = RequestSignals::new("android");
        let result = c.handle_mobile(&mut signals).unwrap();
        assert_eq!(result.format(), Some("mobile"));
        assert_eq!(signals.negotiated.format, "mobile");
        assert_eq!(signals.negotiated.formats, vec!["mobile"]);
    }

    #[test]
    fn handle_mobile_uses_chain_as_candidates() {
        let (config, registry) = setup(Configuration::builder().fallback_chains([
            ("iphone", vec!["iphone", "mobile", "html"]),
            ("mobile", vec!["mobile", "html"]),
        ]));
        let c = MobileClassifier::new(&config, &registry);
        let mut signals = RequestSignals::new(IPHONE);
        c.handle_mobile(&mut signals).unwrap();
        assert_eq!(signals.negotiated.format, "iphone");
        assert_eq!(signals.negotiated.formats, vec!["iphone", "mobile", "html"]);
    }

    #[test]
    fn handle_mobile_without_chain_uses_single_format() {
        let (config, registry) = setup(
            Configuration::builder().fallback_chains(Vec::<(&str, Vec<&str>)>::new()),
        );
        let c = MobileClassifier::new(&config, &registry);
        let mut signals = RequestSignals::new(IPHONE);
        c.handle_mobile(&mut signals).unwrap();
        assert_eq!(signals.negotiated.format, "mobile");
        assert_eq!(signals.negotiated.formats, vec!["mobile"]);
    }

    #[test]
    fn request_device_matches_registered_devices() {
        let mut registry = DeviceRegistry::new();
        registry.register([("custom_phone", r"custom\s+browser")]);
        let config = Configuration::default();
        let c = MobileClassifier::new(&config, &registry);
        let signals = RequestSignals::new("very custom browser WebKit");
        assert!(!c.request_device(&signals, "iphone").unwrap());
        assert!(c.request_device(&signals, "custom_phone").unwrap());

        let android = RequestSignals::new("This is Android browser Mobile");
        assert!(!c.request_device(&android, "iphone").unwrap());
        assert!(c.request_device(&android, "android_phone").unwrap());
    }

    #[test]
    fn select_format_returns_matching_chain_device() {
        let (config, mut registry) = setup(Configuration::builder().fallback_chains([
            ("html", vec!["html", "htm"]),
            ("mp3", vec!["mp3", "wav", "mid"]),
        ]));
        registry.register([("html", "(?i)html-only-browser"), ("mp3", "(?i)mp3 player")]);
        let c = MobileClassifier::new(&config, &registry);
        assert_eq!(c.select_format(&RequestSignals::new("Generic MP3 Player")).unwrap(), "mp3");
        assert_eq!(c.select_format(&RequestSignals::new("android")).unwrap(), "mobile");
    }

    #[test]
    fn select_format_prefers_declared_order() {
        let (config, registry) = setup(Configuration::builder().fallback_chains([
            ("iphone", vec!["iphone", "mobile", "html"]),
            ("android", vec!["android", "html"]),
            ("mobile", vec!["mobile", "html"]),
        ]));
        let c = MobileClassifier::new(&config, &registry);
        assert_eq!(c.select_format(&RequestSignals::new(ANDROID_PHONE)).unwrap(), "android");

        let (config, registry) = setup(Configuration::builder().fallback_chains([
            ("mobile", vec!["mobile", "html"]),
            ("android", vec!["android", "html"]),
        ]));
        let c = MobileClassifier::new(&config, &registry);
        assert_eq!(c.select_format(&RequestSignals::new(ANDROID_PHONE)).unwrap(), "mobile");
    }

    #[test]
    fn unknown_devices_are_errors() {
        let (config, registry) = setup(Configuration::builder().skip_user_agents(["zune_hd"]));
        assert!(matches!(
            classify(&RequestSignals::new(IPHONE), &config, &registry),
            Err(Error::UnknownDevice(name)) if name == "zune_hd"
        ));

        let (config, registry) =
            setup(Configuration::builder().fallback_chains([("mp3", vec!["mp3", "wav"])]));
        assert!(matches!(
            classify(&RequestSignals::new(IPHONE), &config, &registry),
            Err(Error::UnknownDevice(name)) if name == "mp3"
        ));
    }

    #[test]
    fn broken_pattern_is_not_a_miss() {
        let (config, mut registry) =
            setup(Configuration::builder().fallback_chains([("broken", vec!["broken"])]));
        registry.register([("broken", "(?i)iphone(")]);
        assert!(matches!(
            classify(&RequestSignals::new(IPHONE), &config, &registry),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn classification_is_repeatable() {
        let (config, registry) = defaults();
        let signals = RequestSignals::new(IPHONE).with_param(FORMAT_PARAM, "mobile");
        let first = classify(&signals, &config, &registry).unwrap();
        let second = classify(&signals, &config, &registry).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn batch_matches_sequential() {
        let (config, registry) = setup(Configuration::builder().fallback_chains([
            ("iphone", vec!["iphone", "mobile"]),
            ("mobile", vec!["mobile", "html"]),
        ]));
        let c = MobileClassifier::new(&config, &registry);
        let batch: Vec<RequestSignals> = [IPHONE, DESKTOP, ANDROID_PHONE, "ipad"]
            .iter()
            .cycle()
            .take(64)
            .map(|ua| RequestSignals::new(*ua))
            .collect();
        let parallel: Vec<Classification> =
            c.classify_all(&batch).into_iter().map(|r| r.unwrap()).collect();
        let sequential: Vec<Classification> =
            batch.iter().map(|s| c.classify(s).unwrap()).collect();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel[0].format(), Some("iphone"));
        assert_eq!(parallel[1], Classification::Standard);
    }
}
