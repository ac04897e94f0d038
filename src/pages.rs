//! Static page content: landing, legal pages and not-found

pub struct Section {
    pub heading: &'static str,
    pub body: &'static str,
}

pub struct StaticPage {
    pub title: &'static str,
    pub sections: &'static [Section],
}

pub const PRODUCT_NAME: &str = "pagemark";

pub const LANDING_TAGLINE: &str = "A document viewer with the annotation tools you need \
                                   to highlight, comment on and correct your documents.";

pub const LANDING: StaticPage = StaticPage {
    title: "pagemark",
    sections: &[
        Section {
            heading: "Edit Documents",
            body: "Correct the text of plain-text documents in place.",
        },
        Section {
            heading: "Annotate Documents",
            body: "Highlight passages and add comments to any page.",
        },
        Section {
            heading: "Convert Files",
            body: "Pick a target format and convert the open document.",
        },
        Section {
            heading: "AI Assistant",
            body: "Ask questions about your documents in a chat panel.",
        },
        Section {
            heading: "Developer Chat",
            body: "Request code samples and run them in a preview.",
        },
    ],
};

pub const TERMS: StaticPage = StaticPage {
    title: "Terms of Service",
    sections: &[
        Section {
            heading: "1. Acceptance of Terms",
            body: "By accessing or using pagemark, you agree to be bound by these Terms of \
                   Service. If you do not agree to these terms, please do not use the service.",
        },
        Section {
            heading: "2. Description of Service",
            body: "pagemark provides tools for viewing, annotating and converting documents. \
                   The service lets users add highlights, comments and text edits to their files.",
        },
        Section {
            heading: "3. User Accounts",
            body: "You may be required to create an account to use certain features. You are \
                   responsible for keeping your account information confidential and for all \
                   activity under your account.",
        },
        Section {
            heading: "4. User Content",
            body: "You retain all rights to your content. Opening a document in pagemark grants \
                   the application permission to read and display it on your behalf.",
        },
        Section {
            heading: "5. Prohibited Uses",
            body: "You may not use pagemark for any illegal purpose or to violate any laws, nor \
                   to process content that infringes on intellectual property rights.",
        },
        Section {
            heading: "6. Cookies",
            body: "pagemark stores a small number of cookies to remember your consent choices. \
                   By using the service you consent to them as described in the Privacy Policy.",
        },
        Section {
            heading: "7. Limitation of Liability",
            body: "pagemark is provided \"as is\" without warranties of any kind. We are not \
                   liable for any damages arising from your use of the service.",
        },
        Section {
            heading: "8. Changes to Terms",
            body: "These terms may change at any time. Continued use of pagemark after a change \
                   constitutes acceptance of the new terms.",
        },
    ],
};

pub const PRIVACY: StaticPage = StaticPage {
    title: "Privacy Policy",
    sections: &[
        Section {
            heading: "1. Information We Collect",
            body: "We collect the information you provide when you create an account or use \
                   the service. This may include your name, email address and preferences.",
        },
        Section {
            heading: "2. How We Use Your Information",
            body: "Your information is used to provide and improve the service and to keep \
                   your account secure.",
        },
        Section {
            heading: "3. Cookies",
            body: "Cookies record your consent and whether you accepted the terms, so you are \
                   not asked again on every start.",
        },
        Section {
            heading: "4. Cookie Types",
            body: "Essential cookies are required for the operation of the service. No \
                   analytical, functionality or targeting cookies are set.",
        },
        Section {
            heading: "5. Managing Cookies",
            body: "Cookies live in the application's data directory. Deleting that file resets \
                   every consent choice.",
        },
        Section {
            heading: "6. Third-Party Services",
            body: "Sign-in may be handled by a third-party identity provider, which only \
                   receives what it needs to authenticate you.",
        },
        Section {
            heading: "7. Data Security",
            body: "We take reasonable measures to protect your information. No method of \
                   electronic storage is completely secure.",
        },
        Section {
            heading: "8. Changes to Privacy Policy",
            body: "This policy may be updated from time to time. Changes are published on \
                   this page.",
        },
    ],
};

pub const NOT_FOUND: StaticPage = StaticPage {
    title: "404",
    sections: &[Section {
        heading: "Oops! Page not found",
        body: "Press Enter to return home.",
    }],
};
