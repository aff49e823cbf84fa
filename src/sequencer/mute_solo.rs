use crate::pattern::Track;

// Solo beats mute: once anything is soloed, only soloed tracks play, whatever
// their own mute flag says.
pub fn should_play(any_solo: bool, track: &Track) -> bool {
    if any_solo { track.solo } else { !track.muted }
}

pub fn resolve(tracks: &[Track], candidate: &Track) -> bool {
    should_play(tracks.iter().any(|t| t.solo), candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(flags: &[(bool, bool)]) -> Vec<Track> {
        flags
            .iter()
            .enumerate()
            .map(|(i, &(muted, solo))| Track { muted, solo, ..Track::new(i as u32) })
            .collect()
    }

    #[test]
    fn without_solo_mute_decides() {
        let t = tracks(&[(false, false), (true, false)]);
        assert!(resolve(&t, &t[0]));
        assert!(!resolve(&t, &t[1]));
    }

    #[test]
    fn solo_silences_everything_else() {
        let t = tracks(&[(false, false), (false, true), (true, false)]);
        assert!(!resolve(&t, &t[0]));
        assert!(resolve(&t, &t[1]));
        assert!(!resolve(&t, &t[2]));
    }

    #[test]
    fn soloed_track_plays_even_when_muted() {
        let t = tracks(&[(true, true), (false, false)]);
        assert!(resolve(&t, &t[0]));
        assert!(!resolve(&t, &t[1]));
    }

    #[test]
    fn several_solos_all_play() {
        let t = tracks(&[(false, true), (false, true), (false, false)]);
        assert!(resolve(&t, &t[0]));
        assert!(resolve(&t, &t[1]));
        assert!(!resolve(&t, &t[2]));
    }
}
