use folio_core::ServiceMethodKind::{self, Create, Find, Get, Patch, Remove, Update};

use crate::services::adapters::{ContentSchema, ImageField};

const CRUD: &[ServiceMethodKind] = &[Find, Get, Create, Update, Patch, Remove];
const NO_DELETE: &[ServiceMethodKind] = &[Find, Get, Create, Update, Patch];
const NO_UPDATE: &[ServiceMethodKind] = &[Find, Get, Create, Remove];

const fn list(collection: &'static str, label: &'static str) -> ContentSchema {
    ContentSchema {
        collection,
        label,
        required: &[],
        json_fields: &[],
        nested: &[],
        images: &[],
        methods: CRUD,
        singleton: false,
        upsert: false,
    }
}

pub const NAVBAR: ContentSchema = ContentSchema {
    required: &["title", "url"],
    ..list("navbar", "Navbar item")
};

pub const BANNER: ContentSchema = ContentSchema {
    required: &["title", "heading", "description"],
    images: &[ImageField::required("image", "backgroundImageUrl", "banner-images")],
    ..list("banner", "Banner item")
};

pub const LOGO: ContentSchema = ContentSchema {
    images: &[ImageField::required("image", "logoUrl", "logo-images")],
    methods: NO_DELETE,
    singleton: true,
    ..list("logo", "Logo")
};

pub const CONTACT_INFO: ContentSchema = ContentSchema {
    required: &["phone", "email"],
    singleton: true,
    upsert: true,
    ..list("contact-info", "Contact info")
};

pub const SOCIAL_LINKS: ContentSchema = ContentSchema {
    required: &["url", "icon"],
    ..list("social-links", "Social link")
};

pub const BLOGS: ContentSchema = ContentSchema {
    required: &["title", "date", "link"],
    images: &[ImageField::required("image", "image", "blog-images")],
    ..list("blogs", "Blog")
};

pub const BLOG_TEXTS: ContentSchema = ContentSchema {
    required: &["title", "heading", "description"],
    methods: NO_DELETE,
    ..list("blog-texts", "Blog text")
};

pub const SERVICES: ContentSchema = ContentSchema {
    required: &["subTitle", "title", "img1Title", "img2Title", "img3Title", "img4Title"],
    json_fields: &["description"],
    images: &[
        ImageField::required("img1", "img1", "service-images"),
        ImageField::required("img2", "img2", "service-images"),
        ImageField::required("img3", "img3", "service-images"),
        ImageField::required("img4", "img4", "service-images"),
    ],
    methods: NO_DELETE,
    ..list("services", "Service")
};

pub const ABOUT: ContentSchema = ContentSchema {
    required: &["subTitle", "title", "description", "services", "companyName", "founders"],
    json_fields: &["services"],
    images: &[
        ImageField::required("img1", "img1", "about-images"),
        ImageField::required("img2", "img2", "about-images"),
        ImageField::required("signImage", "signImage", "about-images"),
    ],
    singleton: true,
    ..list("about", "About")
};

pub const WHY_CHOOSE_US: ContentSchema = ContentSchema {
    required: &["sectionTitle", "subtitle"],
    json_fields: &["features"],
    images: &[ImageField::required("image", "mainImage", "whychooseus-images")],
    methods: NO_DELETE,
    singleton: true,
    ..list("whychooseus", "Why choose us")
};

pub const DOCTORS: ContentSchema = ContentSchema {
    required: &["title", "time"],
    nested: &[
        ("facebook", "socialLinks.facebook"),
        ("twitter", "socialLinks.twitter"),
        ("linkedin", "socialLinks.linkedin"),
        ("instagram", "socialLinks.instagram"),
    ],
    images: &[ImageField::required("img", "img", "DoctorService-images")],
    ..list("doctors", "Doctor")
};

pub const FOOTER: ContentSchema = ContentSchema {
    required: &["text", "socialLinks", "quickLinks", "contactInfo", "copyright"],
    json_fields: &["socialLinks", "quickLinks", "contactInfo"],
    nested: &[("text", "description.text")],
    images: &[ImageField::required("logo", "description.logo", "logo-images")],
    methods: NO_DELETE,
    singleton: true,
    ..list("footer", "Footer")
};

pub const PARTNERS: ContentSchema = ContentSchema {
    images: &[ImageField::required("PartnerImage", "PartnerImage", "partner-images")],
    methods: NO_UPDATE,
    ..list("partners", "Partner")
};

pub const CTA: ContentSchema = ContentSchema {
    required: &["ctaTitle", "ctaSubtitle", "phoneNumber"],
    images: &[ImageField::required("CTAbg", "CTAbg", "CTA-BG")],
    ..list("cta", "CTA")
};

pub const FUN_FACTS: ContentSchema = ContentSchema {
    required: &["number", "label"],
    methods: NO_DELETE,
    ..list("fun-facts", "Fun fact")
};

/// Position-bearing collections, served by the ordered service.
pub const ORDERED: &[ContentSchema] = &[NAVBAR, BANNER];

/// Plain collections and singletons, served by the content service.
pub const CONTENT: &[ContentSchema] = &[
    LOGO,
    CONTACT_INFO,
    SOCIAL_LINKS,
    BLOGS,
    BLOG_TEXTS,
    SERVICES,
    ABOUT,
    WHY_CHOOSE_US,
    DOCTORS,
    FOOTER,
    PARTNERS,
    CTA,
];
