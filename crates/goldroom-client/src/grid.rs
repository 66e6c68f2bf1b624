use uuid::Uuid;

use goldroom_types::models::Participant;

use crate::media::MediaControls;

/// One card in the video grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub participant_id: Uuid,
    pub display_name: String,
    pub is_local: bool,
    pub show_video: bool,
    pub is_muted: bool,
    pub is_online: bool,
}

impl Tile {
    /// Upper-cased first letter, shown when video is off.
    pub fn initial(&self) -> Option<char> {
        self.display_name.chars().next().and_then(|c| c.to_uppercase().next())
    }
}

/// Local tile first, labelled with the local user name and driven by local
/// media state, then every other participant in list order.
pub fn build_tiles(
    participants: &[Participant],
    current: Option<&Participant>,
    user_name: &str,
    media: &MediaControls,
) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(participants.len() + 1);

    if let Some(me) = current {
        tiles.push(Tile {
            participant_id: me.id,
            display_name: user_name.to_string(),
            is_local: true,
            show_video: media.shows_local_video(),
            is_muted: !media.is_audio_on(),
            is_online: me.is_online,
        });
    }

    tiles.extend(
        participants
            .iter()
            .filter(|p| Some(p.id) != current.map(|c| c.id))
            .map(|p| Tile {
                participant_id: p.id,
                display_name: p.display_name.clone(),
                is_local: false,
                show_video: !p.is_video_off,
                is_muted: p.is_muted,
                is_online: p.is_online,
            }),
    );

    tiles
}

/// Column count for the widest layout.
pub fn grid_columns(participant_count: usize) -> usize {
    match participant_count {
        0 | 1 => 1,
        2..=4 => 2,
        _ => 3,
    }
}
