// Remote service clients

pub mod spotify;

pub use spotify::SpotifyClient;
